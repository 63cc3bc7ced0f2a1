//! docsync - LLM-backed README synchronizer
//!
//! Scans source files, produces natural-language summaries of their content
//! via a pluggable text-generation backend, and merges those summaries into
//! per-directory README.md files without disturbing unrelated content.
//!
//! ## Core Pipeline
//!
//! - **Unit extraction**: structural decomposition via tree-sitter with a
//!   token-budgeted chunk fallback
//! - **Generation gateway**: process-wide cache, classified retry/backoff,
//!   optional model preloading
//! - **Summarizer**: bounded fan-out of unit prompts, ordinal-ordered rollup
//! - **Doc injection**: idempotent marker-delimited sections with atomic
//!   writes and per-document serialization
//!
//! ## Quick Start
//!
//! ```ignore
//! use docsync::{Config, GenerationGateway, Pipeline};
//!
//! let config = Config::default();
//! let gateway = Arc::new(GenerationGateway::from_config(&config.llm)?);
//! let pipeline = build_pipeline(&config, gateway);
//! let report = pipeline.run(files).await;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: backend providers, cache, retry policy, gateway
//! - [`extract`]: unit extraction and chunking
//! - [`summarize`]: per-file summarization and rollup
//! - [`inject`]: documentation file injection and pruning
//! - [`pipeline`]: batch orchestration
//! - [`scan`]: file discovery and exclusion rules

pub mod ai;
pub mod config;
pub mod constants;
pub mod extract;
pub mod inject;
pub mod pipeline;
pub mod scan;
pub mod summarize;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Backend, Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, LlmError, Result, SyncError};

// Data Model
pub use types::unit::{CodeUnit, Summary, UnitKind};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use ai::{GenerationCache, GenerationGateway, LlmProvider, RetryPolicy, SharedProvider};
pub use extract::{ExtractOptions, UnitExtractor};
pub use inject::DocInjector;
pub use pipeline::{BatchReport, FileOutcome, Pipeline, PipelineOptions};
pub use scan::Scanner;
pub use summarize::{Summarizer, SummarizerOptions};

//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/docsync/) and project (.docsync/) level
//! configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{budget, network, pipeline, retry};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Text-generation backend settings
    pub llm: LlmConfig,

    /// Concurrency and splitting settings
    pub pipeline: PipelineConfig,

    /// File discovery settings
    pub scan: ScanConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `SyncError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(crate::types::SyncError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.context_tokens() < budget::SINGLE_PASS_TOKENS {
            return Err(crate::types::SyncError::Config(format!(
                "llm.context_tokens must be at least {}, got {}",
                budget::SINGLE_PASS_TOKENS,
                self.llm.context_tokens()
            )));
        }

        if self.pipeline.unit_workers == 0 {
            return Err(crate::types::SyncError::Config(
                "pipeline.unit_workers must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.single_pass_tokens == 0 {
            return Err(crate::types::SyncError::Config(
                "pipeline.single_pass_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.backend == Backend::OpenAi && self.llm.endpoint.is_none() {
            return Err(crate::types::SyncError::Config(
                "llm.endpoint is required for the openai backend".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Backend Configuration
// =============================================================================

/// Which text-generation backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Locally running Ollama daemon
    #[default]
    Ollama,
    /// Remote OpenAI-compatible chat completions API
    OpenAi,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Ollama => write!(f, "ollama"),
            Backend::OpenAi => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" | "local" => Ok(Backend::Ollama),
            "openai" | "remote" => Ok(Backend::OpenAi),
            _ => Err(format!(
                "invalid backend '{}'. Valid values: ollama, openai",
                s
            )),
        }
    }
}

/// Backend connection and retry settings
///
/// Note: the API key is never serialized back out; each provider converts
/// it to a SecretString internally for runtime protection.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend type
    pub backend: Backend,

    /// Model name (backend-specific default when unset)
    pub model: Option<String>,

    /// Endpoint base URL (backend-specific default when unset)
    pub endpoint: Option<String>,

    /// API key for the remote backend
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum retries after the initial attempt
    pub max_retries: u32,

    /// Base delay for exponential backoff (seconds)
    pub base_delay_secs: u64,

    /// Fixed delay while the local model is still loading (seconds)
    pub model_loading_delay_secs: u64,

    /// Request timeout (seconds)
    pub timeout_secs: u64,

    /// Model context window in tokens; 0 selects the backend default
    pub context_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Ollama,
            model: None,
            endpoint: None,
            api_key: None,
            max_retries: retry::DEFAULT_MAX_RETRIES,
            base_delay_secs: retry::BASE_DELAY_SECS,
            model_loading_delay_secs: retry::MODEL_LOADING_DELAY_SECS,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            context_tokens: 0,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_retries", &self.max_retries)
            .field("base_delay_secs", &self.base_delay_secs)
            .field("model_loading_delay_secs", &self.model_loading_delay_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("context_tokens", &self.context_tokens)
            .finish()
    }
}

impl LlmConfig {
    /// Effective context window for the configured backend
    pub fn context_tokens(&self) -> usize {
        if self.context_tokens > 0 {
            return self.context_tokens;
        }
        match self.backend {
            Backend::Ollama => budget::LOCAL_CONTEXT_TOKENS,
            Backend::OpenAi => budget::REMOTE_CONTEXT_TOKENS,
        }
    }

    /// Character budget for input source code per request
    pub fn input_char_budget(&self) -> usize {
        let input_tokens = (self.context_tokens() as f64 * budget::INPUT_CODE_CTX_RATIO) as usize;
        (input_tokens * budget::AVG_CHARS_PER_TOKEN).max(budget::MIN_CHUNK_CHARS)
    }
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Concurrent files; 0 selects the backend default
    pub file_workers_override: usize,

    /// Concurrent unit-level generation calls within one file
    pub unit_workers: usize,

    /// Files at or below this estimated token count are summarized in a
    /// single pass without decomposition
    pub single_pass_tokens: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            file_workers_override: 0,
            unit_workers: pipeline::UNIT_WORKERS,
            single_pass_tokens: budget::SINGLE_PASS_TOKENS,
        }
    }
}

impl PipelineConfig {
    /// Effective file-level concurrency for a backend
    pub fn file_workers_for(&self, backend: Backend) -> usize {
        if self.file_workers_override > 0 {
            return self.file_workers_override;
        }
        match backend {
            Backend::Ollama => pipeline::LOCAL_FILE_WORKERS,
            Backend::OpenAi => pipeline::REMOTE_FILE_WORKERS,
        }
    }
}

// =============================================================================
// Scan Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extensions eligible for summarization (no leading dot)
    pub include_exts: Vec<String>,

    /// Glob patterns matched against every ancestor directory name
    pub exclude_dirs: Vec<String>,

    /// Glob patterns matched against the file name
    pub exclude_files: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_exts: [
                "py", "js", "jsx", "ts", "tsx", "rs", "go", "c", "h", "cpp", "hpp", "cxx",
                "hxx", "java", "cs", "php", "rb",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude_dirs: [
                ".git",
                ".idea",
                ".vscode",
                "dist",
                "build",
                "out",
                "bin",
                "obj",
                "target",
                "coverage",
                "tmp",
                "node_modules",
                ".next",
                ".turbo",
                ".venv",
                "venv",
                "env",
                "__pycache__",
                ".pytest_cache",
                ".tox",
                ".mypy_cache",
                "*.egg-info",
                ".gradle",
                "vendor",
                "CMakeFiles",
                "cmake-build*",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude_files: [
                "*.min.js",
                "*.test.js",
                "*.spec.js",
                "*.test.jsx",
                "*.spec.jsx",
                "*.test.ts",
                "*.spec.ts",
                "*.test.tsx",
                "*.spec.tsx",
                "*.test.py",
                "*_test.py",
                "*_test.go",
                "*.generated.js",
                "*_generated.py",
                "*_pb2.py",
                "*_pb2_grpc.py",
                "setup.py",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

//! LLM Backend Abstraction
//!
//! Defines the LlmProvider trait for plain-text generation. Providers make
//! exactly one attempt per call and classify their failures; caching and
//! retry live in the gateway above them.
//!
//! ## Modules
//!
//! - `ollama`: locally running Ollama daemon
//! - `openai`: remote OpenAI-compatible chat completions API

mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Backend, LlmConfig};
use crate::types::Result;

/// Shared provider type for concurrent access across pipeline stages.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

/// Text-generation backend.
///
/// `generate` is a single attempt: implementations return a classified
/// `SyncError::Llm` on failure and never retry internally.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Idempotent request that brings the model into memory.
    /// Backends without a resident-model concept succeed immediately.
    async fn warm(&self) -> Result<()>;

    /// Backend name for logging and cache keys
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &LlmConfig) -> Result<SharedProvider> {
    match config.backend {
        Backend::Ollama => Ok(Arc::new(OllamaProvider::new(config)?)),
        Backend::OpenAi => Ok(Arc::new(OpenAiProvider::new(config)?)),
    }
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider shared by gateway, summarizer, and pipeline tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::types::{ErrorCategory, LlmError, Result, SyncError};

    /// One scripted response, consumed in order.
    #[derive(Debug, Clone)]
    pub enum Step {
        Reply(String),
        Fail(ErrorCategory),
    }

    /// Provider that replays a script, then answers every remaining call
    /// with a canned success. Prompts containing a poisoned needle always
    /// fail regardless of the script.
    pub struct ScriptedProvider {
        script: Mutex<VecDeque<Step>>,
        poisoned: Vec<(String, ErrorCategory)>,
        calls: AtomicUsize,
        default_reply: String,
    }

    impl ScriptedProvider {
        pub fn new(script: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                poisoned: Vec::new(),
                calls: AtomicUsize::new(0),
                default_reply: "generated summary".to_string(),
            }
        }

        pub fn succeeding() -> Self {
            Self::new(Vec::new())
        }

        pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
            self.default_reply = reply.into();
            self
        }

        /// Permanently fail any prompt containing `needle`.
        pub fn poison(mut self, needle: impl Into<String>, category: ErrorCategory) -> Self {
            self.poisoned.push((needle.into(), category));
            self
        }

        /// Total generate calls observed (cache hits never reach here).
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl super::LlmProvider for ScriptedProvider {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            for (needle, category) in &self.poisoned {
                if prompt.contains(needle.as_str()) {
                    return Err(SyncError::Llm(LlmError::with_backend(
                        *category,
                        format!("poisoned prompt: {}", needle),
                        "scripted",
                    )));
                }
            }

            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Step::Reply(text)) => Ok(text),
                Some(Step::Fail(category)) => Err(SyncError::Llm(LlmError::with_backend(
                    category,
                    "scripted failure",
                    "scripted",
                ))),
                None => Ok(self.default_reply.clone()),
            }
        }

        async fn warm(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }
}

//! Backend invocation layer: providers, cache, retry policy, and the
//! gateway that composes them.

mod cache;
mod gateway;
pub mod provider;
mod retry;

pub use cache::GenerationCache;
pub use gateway::GenerationGateway;
pub use provider::{LlmProvider, OllamaProvider, OpenAiProvider, SharedProvider, create_provider};
pub use retry::{Disposition, RetryPolicy};

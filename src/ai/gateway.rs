//! Generation Gateway
//!
//! The resilient invocation layer in front of a backend: consult the cache,
//! make the call, classify failures, and retry on the policy's schedule.
//! Owns optional model preloading for backends with a cold-start penalty.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::cache::GenerationCache;
use super::provider::{SharedProvider, create_provider};
use super::retry::{Disposition, RetryPolicy};
use crate::config::LlmConfig;
use crate::constants::retry;
use crate::types::{Result, SyncError};

pub struct GenerationGateway {
    provider: SharedProvider,
    cache: Arc<GenerationCache>,
    policy: RetryPolicy,
}

impl GenerationGateway {
    pub fn new(provider: SharedProvider, cache: Arc<GenerationCache>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            cache,
            policy,
        }
    }

    /// Build a gateway with a fresh cache from backend configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = create_provider(config)?;
        Ok(Self::new(
            provider,
            Arc::new(GenerationCache::new()),
            RetryPolicy::from_config(config),
        ))
    }

    pub fn backend_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Generate text for a prompt, served from cache when possible.
    ///
    /// Cache hits return immediately with no retry accounting. On a miss
    /// the backend is called with up to `max_retries` retries; only a
    /// successful response is written back to the cache, so a failing
    /// prompt never poisons it. After exhaustion the last classified error
    /// is returned - never silently-empty text.
    pub async fn invoke(&self, prompt: &str) -> Result<String> {
        let key =
            GenerationCache::cache_key(self.provider.name(), self.provider.model(), prompt);

        if let Some(hit) = self.cache.get(&key) {
            debug!("cache hit for prompt ({} chars)", prompt.len());
            return Ok(hit);
        }

        let mut retries = 0u32;
        loop {
            match self.provider.generate(prompt).await {
                Ok(text) => {
                    self.cache.insert(key, text.clone());
                    return Ok(text);
                }
                Err(SyncError::Llm(err)) => {
                    let disposition = self.policy.classify(&err);

                    if disposition == Disposition::Fatal {
                        warn!("{} failed fatally: {}", self.provider.name(), err);
                        return Err(SyncError::Llm(err));
                    }
                    if retries >= self.policy.max_retries {
                        warn!(
                            "{} failed after {} retries: {}",
                            self.provider.name(),
                            retries,
                            err
                        );
                        return Err(SyncError::Llm(err));
                    }

                    // A rate-limit response's own hint beats the schedule
                    let delay = err
                        .retry_after
                        .unwrap_or_else(|| self.policy.delay_for(disposition, retries));

                    warn!(
                        "{} attempt {} failed ({}), retrying in {:?}",
                        self.provider.name(),
                        retries + 1,
                        err,
                        delay
                    );
                    sleep(delay).await;
                    retries += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Bring the model into memory before concurrent traffic begins.
    ///
    /// Bounded attempts with the model-loading delay between them; callers
    /// that anticipate high concurrency run this once at startup so every
    /// concurrent first call doesn't pay the cold-start penalty. Failure is
    /// reported, not fatal - the retry policy covers stragglers.
    pub async fn preload(&self) -> bool {
        info!(
            "Preloading model {} on {}",
            self.provider.model(),
            self.provider.name()
        );

        for attempt in 1..=retry::PRELOAD_ATTEMPTS {
            match self.provider.warm().await {
                Ok(()) => {
                    info!("Model {} preloaded", self.provider.model());
                    return true;
                }
                Err(e) => {
                    warn!(
                        "Preload attempt {}/{} failed: {}",
                        attempt,
                        retry::PRELOAD_ATTEMPTS,
                        e
                    );
                    if attempt < retry::PRELOAD_ATTEMPTS {
                        sleep(self.policy.model_loading_delay).await;
                    }
                }
            }
        }

        warn!(
            "Failed to preload model {} after {} attempts",
            self.provider.model(),
            retry::PRELOAD_ATTEMPTS
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::{ScriptedProvider, Step};
    use crate::types::ErrorCategory;
    use std::time::{Duration, Instant};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            model_loading_delay: Duration::from_millis(40),
            max_delay: Duration::from_millis(20),
        }
    }

    fn gateway_with(provider: Arc<ScriptedProvider>, max_retries: u32) -> GenerationGateway {
        GenerationGateway::new(
            provider,
            Arc::new(GenerationCache::new()),
            fast_policy(max_retries),
        )
    }

    #[tokio::test]
    async fn test_identical_prompts_hit_cache() {
        let provider = Arc::new(ScriptedProvider::succeeding());
        let gateway = gateway_with(Arc::clone(&provider), 2);

        let first = gateway.invoke("summarize file A").await.unwrap();
        let second = gateway.invoke("summarize file A").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_prompts_issue_independent_calls() {
        let provider = Arc::new(ScriptedProvider::succeeding());
        let gateway = gateway_with(Arc::clone(&provider), 2);

        gateway.invoke("summarize file A").await.unwrap();
        gateway.invoke("summarize file B").await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_transient_retries_bounded_by_max_retries() {
        let provider = Arc::new(
            ScriptedProvider::succeeding().poison("doomed", ErrorCategory::Transient),
        );
        let gateway = gateway_with(Arc::clone(&provider), 3);

        let result = gateway.invoke("doomed prompt").await;
        assert!(matches!(result, Err(SyncError::Llm(_))));

        // Initial attempt plus exactly max_retries retries
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::Fail(ErrorCategory::Network),
            Step::Reply("recovered".to_string()),
        ]));
        let gateway = gateway_with(Arc::clone(&provider), 3);

        let text = gateway.invoke("flaky prompt").await.unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_model_loading_twice_then_success_uses_loading_delay() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::Fail(ErrorCategory::ModelLoading),
            Step::Fail(ErrorCategory::ModelLoading),
            Step::Reply("warmed up".to_string()),
        ]));
        let gateway = gateway_with(Arc::clone(&provider), 5);

        let start = Instant::now();
        let text = gateway.invoke("first call after start").await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(text, "warmed up");
        // Exactly two retries
        assert_eq!(provider.calls(), 3);
        // Two fixed model-loading delays (40ms each), not the 1-2ms
        // generic schedule
        assert!(elapsed >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let provider =
            Arc::new(ScriptedProvider::succeeding().poison("secret", ErrorCategory::Auth));
        let gateway = gateway_with(Arc::clone(&provider), 5);

        let result = gateway.invoke("secret prompt").await;
        assert!(matches!(result, Err(SyncError::Llm(_))));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_never_poison_cache() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::Fail(ErrorCategory::Transient),
            Step::Fail(ErrorCategory::Transient),
            Step::Reply("eventually fine".to_string()),
        ]));
        let gateway = gateway_with(Arc::clone(&provider), 0);

        // First invocation exhausts (no retries allowed) and must not cache
        assert!(gateway.invoke("prompt").await.is_err());
        // Second invocation reaches the backend again
        assert!(gateway.invoke("prompt").await.is_err());
        // Third succeeds and is cached
        assert_eq!(gateway.invoke("prompt").await.unwrap(), "eventually fine");
        assert_eq!(gateway.invoke("prompt").await.unwrap(), "eventually fine");

        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_preload_succeeds() {
        let provider = Arc::new(ScriptedProvider::succeeding());
        let gateway = gateway_with(provider, 2);
        assert!(gateway.preload().await);
    }
}

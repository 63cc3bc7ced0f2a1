//! Retry Policy
//!
//! Classification and timing rules for backend failures, kept as a small
//! standalone object so both are independently testable.
//!
//! Three dispositions drive the loop in the gateway:
//!
//! - **Generic** transient errors back off exponentially with jitter
//! - **ModelLoading** waits a distinctly longer fixed delay; a cold model
//!   load resolves on a different timescale than a flaky connection
//! - **Fatal** errors (auth, malformed request) are never retried

use std::time::Duration;

use rand::Rng;

use crate::config::LlmConfig;
use crate::constants::retry;
use crate::types::{ErrorCategory, LlmError};

/// How a classified failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Retry on the exponential schedule
    TransientGeneric,
    /// Retry after the fixed model-loading delay
    TransientModelLoading,
    /// Do not retry
    Fatal,
}

/// Retry classification and delay schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt
    pub max_retries: u32,
    /// Base delay for the exponential schedule
    pub base_delay: Duration,
    /// Fixed delay for model-loading responses
    pub model_loading_delay: Duration,
    /// Cap on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry::DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_secs(retry::BASE_DELAY_SECS),
            model_loading_delay: Duration::from_secs(retry::MODEL_LOADING_DELAY_SECS),
            max_delay: Duration::from_secs(retry::MAX_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(config.base_delay_secs),
            model_loading_delay: Duration::from_secs(config.model_loading_delay_secs),
            max_delay: Duration::from_secs(retry::MAX_DELAY_SECS),
        }
    }

    /// Map a classified backend error to a disposition.
    pub fn classify(&self, error: &LlmError) -> Disposition {
        match error.category {
            ErrorCategory::ModelLoading => Disposition::TransientModelLoading,
            ErrorCategory::Auth | ErrorCategory::BadRequest => Disposition::Fatal,
            ErrorCategory::RateLimit
            | ErrorCategory::Network
            | ErrorCategory::Transient
            | ErrorCategory::Unknown => Disposition::TransientGeneric,
        }
    }

    /// Delay before retry number `attempt` (0-based) for a disposition.
    ///
    /// A `retry_after` hint carried on the error (rate-limit responses)
    /// takes precedence over the schedule in the gateway; this method is
    /// the schedule itself.
    pub fn delay_for(&self, disposition: Disposition, attempt: u32) -> Duration {
        match disposition {
            Disposition::Fatal => Duration::ZERO,
            Disposition::TransientModelLoading => self.model_loading_delay,
            Disposition::TransientGeneric => {
                let exp = self
                    .base_delay
                    .saturating_mul(2u32.saturating_pow(attempt))
                    .min(self.max_delay);
                exp + jitter(exp)
            }
        }
    }
}

/// Up to 25% random jitter so concurrent workers don't retry in lockstep.
fn jitter(base: Duration) -> Duration {
    let max_jitter_ms = (base.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            model_loading_delay: Duration::from_millis(2_000),
            max_delay: Duration::from_millis(1_000),
        }
    }

    #[test]
    fn test_classify_dispositions() {
        let policy = policy();

        let loading = LlmError::new(ErrorCategory::ModelLoading, "loading model");
        assert_eq!(
            policy.classify(&loading),
            Disposition::TransientModelLoading
        );

        let auth = LlmError::new(ErrorCategory::Auth, "bad key");
        assert_eq!(policy.classify(&auth), Disposition::Fatal);

        let bad = LlmError::new(ErrorCategory::BadRequest, "malformed");
        assert_eq!(policy.classify(&bad), Disposition::Fatal);

        for category in [
            ErrorCategory::RateLimit,
            ErrorCategory::Network,
            ErrorCategory::Transient,
            ErrorCategory::Unknown,
        ] {
            let err = LlmError::new(category, "x");
            assert_eq!(policy.classify(&err), Disposition::TransientGeneric);
        }
    }

    #[test]
    fn test_generic_delay_grows_exponentially() {
        let policy = policy();

        let d0 = policy.delay_for(Disposition::TransientGeneric, 0);
        let d1 = policy.delay_for(Disposition::TransientGeneric, 1);
        let d2 = policy.delay_for(Disposition::TransientGeneric, 2);

        // base * 2^n plus at most 25% jitter
        assert!(d0 >= Duration::from_millis(100) && d0 < Duration::from_millis(125));
        assert!(d1 >= Duration::from_millis(200) && d1 < Duration::from_millis(250));
        assert!(d2 >= Duration::from_millis(400) && d2 < Duration::from_millis(500));
    }

    #[test]
    fn test_generic_delay_capped() {
        let policy = policy();
        let d = policy.delay_for(Disposition::TransientGeneric, 30);
        assert!(d <= Duration::from_millis(1_250));
    }

    #[test]
    fn test_model_loading_delay_fixed_and_longer() {
        let policy = policy();

        let first = policy.delay_for(Disposition::TransientModelLoading, 0);
        let later = policy.delay_for(Disposition::TransientModelLoading, 5);
        assert_eq!(first, later);
        assert_eq!(first, Duration::from_millis(2_000));

        // Distinctly longer than the generic schedule at the same attempt
        assert!(first > policy.delay_for(Disposition::TransientGeneric, 0));
    }

    #[test]
    fn test_fatal_has_no_delay() {
        let policy = policy();
        assert_eq!(policy.delay_for(Disposition::Fatal, 0), Duration::ZERO);
    }

    #[test]
    fn test_backoff_schedule_total_is_bounded() {
        let policy = policy();
        let total: Duration = (0..policy.max_retries)
            .map(|attempt| policy.delay_for(Disposition::TransientGeneric, attempt))
            .sum();
        // 100 + 200 + 400, each with at most 25% jitter
        assert!(total < Duration::from_millis(875 + 1));
    }
}

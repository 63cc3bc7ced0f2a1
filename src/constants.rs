//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry/backoff constants
pub mod retry {
    /// Default maximum retries after the initial attempt
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    /// Base delay for exponential backoff (seconds)
    pub const BASE_DELAY_SECS: u64 = 5;

    /// Fixed delay while the local backend reports the model is still
    /// loading; this resolves on a much slower timescale than generic
    /// transient errors
    pub const MODEL_LOADING_DELAY_SECS: u64 = 20;

    /// Fallback delay when a rate-limit response carries no retry-after
    pub const RATE_LIMIT_DELAY_SECS: u64 = 30;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 120;

    /// Bounded attempts for the one-time model warm-up
    pub const PRELOAD_ATTEMPTS: u32 = 3;
}

/// Token budget constants
pub mod budget {
    /// Share of the model context window allocated to input source code;
    /// the rest is for prompt instructions and the generated output
    pub const INPUT_CODE_CTX_RATIO: f64 = 0.5;

    /// Heuristic characters-per-token estimate for source code
    pub const AVG_CHARS_PER_TOKEN: usize = 3;

    /// Default context window for the local backend (tokens)
    pub const LOCAL_CONTEXT_TOKENS: usize = 32_768;

    /// Default context window for remote models (tokens)
    pub const REMOTE_CONTEXT_TOKENS: usize = 128_000;

    /// Files estimated at or below this many tokens are summarized in a
    /// single pass without decomposition
    pub const SINGLE_PASS_TOKENS: usize = 2_048;

    /// Lower bound on the chunk size so tiny context configs still
    /// produce usable chunks (characters)
    pub const MIN_CHUNK_CHARS: usize = 1_024;
}

/// Pipeline concurrency constants
pub mod pipeline {
    /// Concurrent files when the backend runs locally
    pub const LOCAL_FILE_WORKERS: usize = 2;

    /// Concurrent files against a remote API
    pub const REMOTE_FILE_WORKERS: usize = 6;

    /// Concurrent unit-level generation calls within one file
    pub const UNIT_WORKERS: usize = 4;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Extended timeout for warm-up requests, which may block on a cold
    /// model load
    pub const WARM_TIMEOUT_SECS: u64 = 600;
}

/// Documentation file constants
pub mod doc {
    /// File name of the per-directory documentation file
    pub const DOC_FILE_NAME: &str = "README.md";
}

//! Error types for gitpulse-core

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for the gitpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A single upstream event source failed.
    ///
    /// Recovered locally as an empty contribution; never aborts a fetch cycle.
    #[error("source error: {0}")]
    Source(String),

    /// The upstream rate limit is exhausted.
    ///
    /// The only error that halts a fetch cycle early: continuing to fetch
    /// would worsen the situation, so it is surfaced to the caller instead
    /// of being swallowed.
    #[error("rate limit exhausted")]
    RateLimited {
        /// When the limit resets, if the source reported it
        reset_at: Option<DateTime<Utc>>,
    },
}

impl Error {
    /// Whether this error should halt an in-progress fetch cycle.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}

/// Result type alias for gitpulse-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_is_halting() {
        assert!(Error::RateLimited { reset_at: None }.is_rate_limited());
        assert!(!Error::Source("boom".to_string()).is_rate_limited());
        assert!(!Error::Config("bad".to_string()).is_rate_limited());
    }
}

//! Error taxonomy.
//!
//! `ValidationError` ends a request immediately (HTTP 400). `ProviderError` is absorbed by
//! the sub-analyzers or the fallback cascade and never reaches the end user. Malformed model
//! JSON never becomes an error at all: the normalizer substitutes defaults.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required {0} parameter")]
    MissingField(&'static str),
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Source and target gender are required")]
    GenderRequired,
    #[error("Source and target culture are required")]
    CultureRequired,
}

/// Failure of a single provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Upstream answered 429. The retry hint is passed on, not swallowed.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    /// Upstream answered 5xx (or another non-success status).
    #[error("provider internal error: {0}")]
    InternalError(String),
    /// Connection failure, timeout, empty or non-JSON body.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    /// True for failures reported by the upstream over HTTP (as opposed to transport failures).
    pub fn is_http_status(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::InternalError(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("request timed out: {}", e))
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Error from a sub-analyzer, absorbed by the cascade.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_http_contract() {
        assert_eq!(
            ValidationError::MissingField("model").to_string(),
            "Missing required model parameter"
        );
        assert_eq!(
            ProviderError::RateLimited { retry_after_secs: 120 }.to_string(),
            "rate limited: retry after 120s"
        );
    }

    #[test]
    fn http_status_classification() {
        assert!(ProviderError::RateLimited { retry_after_secs: 1 }.is_http_status());
        assert!(ProviderError::InternalError("boom".into()).is_http_status());
        assert!(!ProviderError::Transport("eof".into()).is_http_status());
    }
}

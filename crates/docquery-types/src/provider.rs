//! Failure contract for external providers (embedding, chat, messaging).

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by any external provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport-level failure (connection refused, reset, DNS)
    #[error("Provider request failed: {0}")]
    Failure(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Timeout waiting for response")]
    Timeout,

    /// A required credential is not configured; no request was sent
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The provider answered but the body did not match the expected shape
    #[error("Failed to parse provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether a retry might succeed.
    ///
    /// Timeouts, rate limits, transport failures and 5xx responses are
    /// transient. Everything else indicates a contract or configuration problem.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::RateLimited | ProviderError::Failure(_) => true,
            ProviderError::Http { status, .. } => *status >= 500,
            ProviderError::MissingCredential(_)
            | ProviderError::Config(_)
            | ProviderError::InvalidResponse(_) => false,
        }
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            ProviderError::RateLimited
        } else {
            ProviderError::Http {
                status: status.as_u16(),
                body,
            }
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Failure(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Timeout.is_retryable());
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Failure("connection reset".into()).is_retryable());
        assert!(ProviderError::Http {
            status: 503,
            body: String::new()
        }
        .is_retryable());

        assert!(!ProviderError::Http {
            status: 401,
            body: "bad key".into()
        }
        .is_retryable());
        assert!(!ProviderError::MissingCredential("SLACK_BOT_TOKEN".into()).is_retryable());
        assert!(!ProviderError::InvalidResponse("no data".into()).is_retryable());
    }

    #[test]
    fn test_from_status_rate_limit() {
        let err = ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new());
        assert_eq!(err, ProviderError::RateLimited);

        let err = ProviderError::from_status(StatusCode::BAD_REQUEST, "bad".into());
        assert_eq!(
            err,
            ProviderError::Http {
                status: 400,
                body: "bad".into()
            }
        );
    }
}

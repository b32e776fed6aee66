//! Client error types.

use std::time::Duration;

use bytes::Bytes;
use hsdp_oauth::OAuthError;
use thiserror::Error;

/// Client error type.
///
/// Every call ends in exactly one of these kinds or a success; no kind is
/// reported as another.
#[derive(Debug, Error)]
pub enum Error {
    /// An access token could not be obtained or refreshed.
    #[error("Authentication failed: {0}")]
    Auth(#[from] OAuthError),

    /// No response arrived before the call deadline.
    #[error("Request timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// Connection-level failure (refused, reset, TLS, interrupted body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    ///
    /// Displays as the raw response body so callers see the platform's own
    /// error details.
    #[error("{}", String::from_utf8_lossy(.body))]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, byte for byte.
        body: Bytes,
    },

    /// A success body did not parse as its declared content type.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Parser diagnostic.
        message: String,
        /// The body that failed to parse.
        body: Bytes,
    },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classify a `reqwest` failure without exposing the `reqwest` type.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Error::Timeout { timeout };
        }

        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Error::Transport(message)
    }

    /// Status code of an HTTP error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw body attached to an HTTP or serialization error.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Error::Http { body, .. } | Error::Serialization { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Http { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_)) || matches!(self, Error::Http { status: 401, .. })
    }

    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Http { status: 429, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Http { status, .. } if *status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_displays_body_verbatim() {
        let err = Error::Http {
            status: 404,
            body: Bytes::from_static(br#"{"issue":"not found"}"#),
        };

        assert_eq!(err.to_string(), r#"{"issue":"not found"}"#);
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_classification_helpers() {
        let timeout = Error::Timeout {
            timeout: Duration::from_millis(200),
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.status(), None);

        let auth = Error::from(OAuthError::Config("missing".to_string()));
        assert!(auth.is_auth_error());

        let unavailable = Error::Http {
            status: 503,
            body: Bytes::new(),
        };
        assert!(unavailable.is_server_error());

        let throttled = Error::Http {
            status: 429,
            body: Bytes::new(),
        };
        assert!(throttled.is_rate_limited());
    }

    #[test]
    fn test_serialization_error_keeps_body() {
        let err = Error::Serialization {
            message: "expected value".to_string(),
            body: Bytes::from_static(b"<html/>"),
        };

        assert_eq!(err.body().map(|b| b.as_ref()), Some(&b"<html/>"[..]));
        assert_eq!(err.status(), None);
    }
}

//! Error types for token acquisition.

use chrono::{DateTime, Utc};

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while obtaining an access token.
///
/// Cloneable so a failed refresh can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    /// The token endpoint could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The token endpoint answered with a non-2xx status.
    #[error("Token endpoint returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// The token endpoint answered 2xx but the payload was unusable.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// The only available token is past its expiry.
    #[error("Token expired at {0}")]
    Expired(DateTime<Utc>),

    /// Missing or invalid configuration.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}

impl From<url::ParseError> for OAuthError {
    fn from(e: url::ParseError) -> Self {
        OAuthError::Config(format!("Invalid IAM URL: {}", e))
    }
}

//! The access token value.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// An issued access token together with its validity window.
///
/// Tokens are immutable once issued. A refresher replaces the whole value
/// instead of patching it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    /// Create a bearer token issued now that lives for `expires_in`.
    pub fn new(access_token: impl Into<String>, expires_in: Duration) -> Self {
        Self::issued_at(access_token, Utc::now(), expires_in)
    }

    /// Create a bearer token with an explicit issue time.
    pub fn issued_at(
        access_token: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> Self {
        let lifetime = TimeDelta::from_std(expires_in).unwrap_or(TimeDelta::MAX);
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token: None,
            scope: None,
            id_token: None,
            issued_at,
            expires_at: issued_at
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Create a token that never expires (pre-issued service tokens, tests).
    pub fn non_expiring(access_token: impl Into<String>) -> Self {
        Self {
            expires_at: DateTime::<Utc>::MAX_UTC,
            ..Self::new(access_token, Duration::ZERO)
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Attach the granted scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Attach an OpenID Connect ID token.
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    /// Override the token type (defaults to `Bearer`).
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    pub fn issued_at_time(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True once `now` has reached the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when the token is expired or will expire within `margin` of `now`.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let margin = TimeDelta::from_std(margin).unwrap_or(TimeDelta::MAX);
        match now.checked_add_signed(margin) {
            Some(threshold) => threshold >= self.expires_at,
            None => true,
        }
    }

    /// Remaining lifetime measured from `now`, zero once expired.
    pub fn expires_in_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Human readable remaining lifetime.
    pub fn expires_in_display(&self) -> String {
        let now = Utc::now();
        if self.is_expired_at(now) {
            return "Expired (will refresh on next use)".to_string();
        }
        if self.expires_at == DateTime::<Utc>::MAX_UTC {
            return "Never".to_string();
        }
        let secs = self.expires_in_at(now).as_secs();
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

//! Handing out valid access tokens.
//!
//! [`TokenRefresher`] is the contract the HTTP pipeline depends on.
//! [`CachingTokenRefresher`] holds one token and refreshes it through a
//! [`TokenSource`] when it is missing or about to expire. Refreshes are
//! single-flight: callers that arrive while a refresh is running wait for it
//! and receive its outcome instead of starting their own.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{OAuthError, Result};
use crate::token::Token;

/// How long before expiry a held token is considered stale.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

// ============================================================================
// Traits
// ============================================================================

/// Supplies an access token that is valid at the moment it is returned.
#[async_trait]
pub trait TokenRefresher: Send + Sync + std::fmt::Debug {
    /// Get the current token, refreshing first if necessary.
    async fn current_token(&self) -> Result<Token>;
}

/// The token-issuing endpoint.
///
/// `previous` is the token being replaced, if any, so implementations can
/// use its refresh token instead of presenting credentials again.
#[async_trait]
pub trait TokenSource: Send + Sync + std::fmt::Debug {
    async fn issue(&self, previous: Option<&Token>) -> Result<Token>;
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for Arc<T> {
    async fn issue(&self, previous: Option<&Token>) -> Result<Token> {
        (**self).issue(previous).await
    }
}

/// Shared refresher for use across clients and tasks.
pub type SharedTokenRefresher = Arc<dyn TokenRefresher>;

// ============================================================================
// CachingTokenRefresher
// ============================================================================

#[derive(Debug, Default)]
struct Slot {
    token: Option<Token>,
    /// Outcome of the most recent refresh if it failed, tagged with its epoch.
    failure: Option<(u64, OAuthError)>,
}

/// Holds one token and refreshes it through a [`TokenSource`].
///
/// The slot mutex is held across check-and-refresh, so at most one refresh
/// reaches the source at a time. Every completed refresh bumps `epoch`;
/// a caller that queued behind a refresh which then failed receives that
/// same failure instead of retrying the source itself.
///
/// Dropping the caller that drives a refresh (for example when its request
/// times out) abandons that refresh and releases the slot; the next queued
/// caller then starts its own.
#[derive(Debug)]
pub struct CachingTokenRefresher<S> {
    source: S,
    margin: Duration,
    slot: Mutex<Slot>,
    epoch: AtomicU64,
}

impl<S: TokenSource> CachingTokenRefresher<S> {
    /// Create a refresher with no token; the first call issues one.
    pub fn new(source: S) -> Self {
        Self {
            source,
            margin: DEFAULT_REFRESH_MARGIN,
            slot: Mutex::new(Slot::default()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Seed the refresher with an already issued token.
    pub fn with_token(source: S, token: Token) -> Self {
        Self {
            slot: Mutex::new(Slot {
                token: Some(token),
                failure: None,
            }),
            ..Self::new(source)
        }
    }

    /// Set how long before expiry a token is refreshed.
    pub fn refresh_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// The token source backing this refresher.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The held token, without refreshing. Waits for an in-flight refresh.
    pub async fn cached(&self) -> Option<Token> {
        self.slot.lock().await.token.clone()
    }

    /// Drop the held token so the next call issues a new one.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        slot.token = None;
        slot.failure = None;
        tracing::debug!("Cached token invalidated");
    }
}

#[async_trait]
impl<S: TokenSource> TokenRefresher for CachingTokenRefresher<S> {
    async fn current_token(&self) -> Result<Token> {
        let seen = self.epoch.load(Ordering::Acquire);
        let mut slot = self.slot.lock().await;

        if let Some(token) = &slot.token
            && !token.needs_refresh_at(Utc::now(), self.margin)
        {
            return Ok(token.clone());
        }

        if let Some((epoch, err)) = &slot.failure
            && *epoch > seen
        {
            return Err(err.clone());
        }

        tracing::info!(
            had_token = slot.token.is_some(),
            "Access token missing or expiring, refreshing"
        );
        let outcome = match self.source.issue(slot.token.as_ref()).await {
            Ok(token) if token.is_expired_at(Utc::now()) => Err(OAuthError::InvalidResponse(
                format!("issued token already expired at {}", token.expires_at()),
            )),
            other => other,
        };
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;

        match outcome {
            Ok(token) => {
                tracing::info!(expires_at = %token.expires_at(), "Access token refreshed");
                slot.token = Some(token.clone());
                slot.failure = None;
                Ok(token)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Access token refresh failed");
                slot.failure = Some((epoch, err.clone()));
                Err(err)
            }
        }
    }
}

// ============================================================================
// StaticTokenRefresher
// ============================================================================

/// Hands out one fixed token and never refreshes.
#[derive(Debug, Clone)]
pub struct StaticTokenRefresher {
    token: Token,
}

impl StaticTokenRefresher {
    pub fn new(token: Token) -> Self {
        Self { token }
    }

    /// A refresher for a raw bearer string that never expires.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self::new(Token::non_expiring(access_token))
    }
}

#[async_trait]
impl TokenRefresher for StaticTokenRefresher {
    async fn current_token(&self) -> Result<Token> {
        if self.token.is_expired_at(Utc::now()) {
            return Err(OAuthError::Expired(self.token.expires_at()));
        }
        Ok(self.token.clone())
    }
}

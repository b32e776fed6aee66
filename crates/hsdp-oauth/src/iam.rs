//! HSDP IAM OAuth2 endpoints.
//!
//! [`IamTokenSource`] issues tokens from `/authorize/oauth2/token` and is
//! the production [`TokenSource`] behind a
//! [`CachingTokenRefresher`](crate::CachingTokenRefresher). It also exposes
//! token revocation and introspection.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{OAuthError, Result};
use crate::refresher::TokenSource;
use crate::token::Token;

const TOKEN_PATH: &str = "authorize/oauth2/token";
const REVOKE_PATH: &str = "authorize/oauth2/revoke";
const INTROSPECT_PATH: &str = "authorize/oauth2/introspect";

/// Default timeout for token endpoint calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the SDK authenticates against IAM when it has no usable refresh token.
#[derive(Clone)]
pub enum Grant {
    /// Resource owner password credentials.
    Password { username: String, password: String },
    /// The OAuth client's own credentials.
    ClientCredentials,
}

impl std::fmt::Debug for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grant::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Grant::ClientCredentials => f.write_str("ClientCredentials"),
        }
    }
}

/// IAM connection settings.
#[derive(Debug, Clone)]
pub struct IamConfig {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    pub grant: Grant,
    pub timeout: Duration,
}

impl IamConfig {
    pub fn new(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        grant: Grant,
    ) -> Self {
        Self {
            url: url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Token payload returned by `/authorize/oauth2/token`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: u64,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> Result<Token> {
        if self.access_token.trim().is_empty() {
            return Err(OAuthError::InvalidResponse(
                "access_token is empty".to_string(),
            ));
        }

        let mut token = Token::issued_at(
            self.access_token,
            Utc::now(),
            Duration::from_secs(self.expires_in),
        );
        if let Some(token_type) = self.token_type {
            token = token.with_token_type(token_type);
        }
        if let Some(refresh_token) = self.refresh_token {
            token = token.with_refresh_token(refresh_token);
        }
        if let Some(scope) = self.scope {
            token = token.with_scope(scope);
        }
        if let Some(id_token) = self.id_token {
            token = token.with_id_token(id_token);
        }
        Ok(token)
    }
}

/// Result of `/authorize/oauth2/introspect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Introspection {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

/// Issues, revokes and introspects tokens against HSDP IAM.
#[derive(Debug, Clone)]
pub struct IamTokenSource {
    config: IamConfig,
    base_url: Url,
    http: reqwest::Client,
}

impl IamTokenSource {
    pub fn new(config: IamConfig) -> Result<Self> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Use an existing `reqwest` client (shares its connection pool).
    pub fn with_client(config: IamConfig, http: reqwest::Client) -> Result<Self> {
        if config.client_id.is_empty() {
            return Err(OAuthError::Config("client_id is required".to_string()));
        }

        let mut base_url = Url::parse(&config.url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            config,
            base_url,
            http,
        })
    }

    pub fn config(&self) -> &IamConfig {
        &self.config
    }

    /// Obtain a token with the configured grant.
    pub async fn login(&self) -> Result<Token> {
        match &self.config.grant {
            Grant::Password { username, password } => {
                self.request_token(&[
                    ("grant_type", "password"),
                    ("username", username.as_str()),
                    ("password", password.as_str()),
                ])
                .await
            }
            Grant::ClientCredentials => {
                self.request_token(&[("grant_type", "client_credentials")])
                    .await
            }
        }
    }

    /// Exchange a refresh token for a new token.
    ///
    /// IAM may omit `refresh_token` in the answer; the presented one stays
    /// valid in that case and is carried over.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token> {
        let token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        if token.refresh_token().is_none() {
            return Ok(token.with_refresh_token(refresh_token));
        }
        Ok(token)
    }

    /// Revoke an access token.
    pub async fn revoke(&self, token: &Token) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint(REVOKE_PATH)?)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header("Api-Version", "2")
            .form(&[("token", token.access_token())])
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Token revoke request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| OAuthError::Network(format!("Revoke response interrupted: {}", e)))?;
            return Err(OAuthError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Access token revoked");
        Ok(())
    }

    /// Ask IAM whether a token is still active.
    pub async fn introspect(&self, token: &Token) -> Result<Introspection> {
        let response = self
            .http
            .post(self.endpoint(INTROSPECT_PATH)?)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header("Api-Version", "3")
            .header(ACCEPT, "application/json")
            .form(&[("token", token.access_token())])
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Introspect request failed: {}", e)))?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(OAuthError::Backend {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            OAuthError::InvalidResponse(format!("Failed to parse introspect response: {}", e))
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<Token> {
        let response = self
            .http
            .post(self.endpoint(TOKEN_PATH)?)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header("Api-Version", "2")
            .header(ACCEPT, "application/json")
            .form(form)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| OAuthError::Network(format!("Token response interrupted: {}", e)))?;

        if !status.is_success() {
            return Err(OAuthError::Backend {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let payload: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            OAuthError::InvalidResponse(format!("Failed to parse token response: {}", e))
        })?;
        payload.into_token()
    }
}

#[async_trait]
impl TokenSource for IamTokenSource {
    async fn issue(&self, previous: Option<&Token>) -> Result<Token> {
        if let Some(refresh_token) = previous.and_then(Token::refresh_token) {
            match self.refresh(refresh_token).await {
                Ok(token) => return Ok(token),
                Err(OAuthError::Backend { status, .. }) if is_rejected_grant(status) => {
                    tracing::warn!(status, "Refresh token rejected, logging in again");
                }
                Err(e) => return Err(e),
            }
        }

        self.login().await
    }
}

/// IAM answers an invalid or revoked refresh token with 400 or 401.
fn is_rejected_grant(status: u16) -> bool {
    matches!(status, 400 | 401)
}

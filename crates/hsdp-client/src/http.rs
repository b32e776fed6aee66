//! The authenticated request pipeline.
//!
//! [`HttpClient::execute`] takes a [`RequestDescriptor`], injects the
//! platform headers and a bearer token, enforces the call deadline and
//! classifies the outcome. It never deserializes: a 2xx answer comes back
//! as an [`ApiResponse`] holding the raw bytes, and the service API that
//! issued the request decides how to parse them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use hsdp_oauth::{OAuthError, SharedTokenRefresher, TokenRefresher};
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::request::RequestDescriptor;

/// Default timeout for a whole call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `Accept` value.
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Header carrying the per-service API version.
pub const API_VERSION: HeaderName = HeaderName::from_static("api-version");

// ─────────────────────────────────────────────────────────────────────────────
// ApiResponse
// ─────────────────────────────────────────────────────────────────────────────

/// A 2xx response, body untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status: u16,
    body: Bytes,
    content_type: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// The `Content-Type` the service declared, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Serialization {
            message: e.to_string(),
            body: self.body.clone(),
        })
    }

    /// Decode the body as UTF-8 text (XML and FHIR payloads).
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| Error::Serialization {
            message: e.to_string(),
            body: self.body.clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HttpClient
// ─────────────────────────────────────────────────────────────────────────────

/// Executes authenticated requests against one service base URL.
///
/// Cloning is cheap; clones share the connection pool and the token
/// refresher.
///
/// # Example
///
/// ```no_run
/// use hsdp_client::{HttpClient, RequestDescriptor};
/// use hsdp_oauth::StaticTokenRefresher;
/// use std::sync::Arc;
///
/// # async fn example() -> hsdp_client::Result<()> {
/// let http = HttpClient::builder()
///     .base_url("https://idm-service.example.com")
///     .token_refresher(Arc::new(StaticTokenRefresher::bearer("token")))
///     .api_version("2")
///     .build()?;
///
/// let response = http
///     .execute(&RequestDescriptor::get("authorize/identity/User").query("userId", "jane"))
///     .await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    transport: reqwest::Client,
    refresher: SharedTokenRefresher,
    base_url: Url,
    default_headers: Arc<HeaderMap>,
    timeout: Duration,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new client builder.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the default call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headers applied to every request unless the request overrides them.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// The refresher that supplies bearer tokens.
    pub fn token_refresher(&self) -> &SharedTokenRefresher {
        &self.refresher
    }

    /// A client for another service that shares transport and refresher.
    pub fn with_base_url(&self, base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..self.clone()
        })
    }

    /// A client for another service and its `Api-Version`.
    pub fn for_service(&self, base_url: &str, api_version: &str) -> Result<Self> {
        let version = HeaderValue::from_str(api_version)
            .map_err(|_| Error::Config(format!("Invalid API version: {:?}", api_version)))?;
        Ok(self
            .with_base_url(base_url)?
            .with_default_header(API_VERSION, version))
    }

    /// A client whose requests carry `name: value` by default.
    pub fn with_default_header(&self, name: HeaderName, value: HeaderValue) -> Self {
        let mut headers = (*self.default_headers).clone();
        headers.insert(name, value);
        Self {
            default_headers: Arc::new(headers),
            ..self.clone()
        }
    }

    /// Build the URL for a request: base URL, path, then query in order.
    pub fn url(&self, request: &RequestDescriptor) -> Result<Url> {
        let path = request.path();
        if Url::parse(path).is_ok() {
            return Err(Error::Config(format!(
                "Request path must be relative to the base URL: {:?}",
                path
            )));
        }

        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::Config(format!("Base URL cannot carry a path: {}", self.base_url))
            })?;
            // Drop the empty segment left by the trailing slash on the base.
            segments.pop_if_empty();
            for segment in path.trim_start_matches('/').split('/') {
                if segment == "." || segment == ".." {
                    return Err(Error::Config(format!(
                        "Request path must not contain dot segments: {:?}",
                        path
                    )));
                }
                segments.push(segment);
            }
        }

        if !request.query_pairs().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query_pairs() {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Execute one request.
    ///
    /// Exactly one network attempt is made. The timeout covers token
    /// acquisition, connect, write and read. A non-2xx answer becomes
    /// [`Error::Http`] carrying the body byte for byte.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        let timeout = request.timeout_override().unwrap_or(self.timeout);
        let url = self.url(request)?;
        let started = Instant::now();

        let outcome = match tokio::time::timeout(timeout, self.send(request, url.clone(), timeout))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Timeout { timeout }),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(response) => tracing::debug!(
                method = %request.method(),
                url = %url,
                status = response.status(),
                elapsed_ms,
                "Request completed"
            ),
            Err(Error::Http { status, .. }) => tracing::warn!(
                method = %request.method(),
                url = %url,
                status,
                elapsed_ms,
                "Request returned error status"
            ),
            Err(e) => tracing::warn!(
                method = %request.method(),
                url = %url,
                elapsed_ms,
                error = %e,
                "Request failed"
            ),
        }
        outcome
    }

    async fn send(
        &self,
        request: &RequestDescriptor,
        url: Url,
        timeout: Duration,
    ) -> Result<ApiResponse> {
        let token = self.refresher.current_token().await?;
        let headers = self.headers(request, token.access_token())?;

        let mut builder = self
            .transport
            .request(request.method().clone(), url)
            .headers(headers);
        if let Some(body) = request.body_ref() {
            builder = builder
                .header(CONTENT_TYPE, body.content_type.as_str())
                .body(body.bytes.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::from_transport(e, timeout))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::from_transport(e, timeout))?;

        if status.is_success() {
            Ok(ApiResponse::new(status.as_u16(), body, content_type))
        } else {
            Err(Error::Http {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Defaults, then request headers on top, then the bearer token.
    fn headers(&self, request: &RequestDescriptor, access_token: &str) -> Result<HeaderMap> {
        let mut headers = (*self.default_headers).clone();
        for (name, value) in request.headers() {
            headers.insert(name.clone(), value.clone());
        }

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", access_token)).map_err(|_| {
            OAuthError::InvalidResponse("access token is not a valid header value".to_string())
        })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        Ok(headers)
    }
}

fn normalize_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an [`HttpClient`].
pub struct HttpClientBuilder {
    base_url: Option<String>,
    refresher: Option<SharedTokenRefresher>,
    timeout: Duration,
    headers: Vec<(String, String)>,
    user_agent: Option<String>,
    transport: Option<reqwest::Client>,
}

impl HttpClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            refresher: None,
            timeout: DEFAULT_TIMEOUT,
            headers: vec![(ACCEPT.to_string(), JSON_UTF8.to_string())],
            user_agent: None,
            transport: None,
        }
    }

    /// Set the service base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the token refresher.
    pub fn token_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Set the default call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add or replace a default header.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Set the default `Api-Version` header.
    pub fn api_version(self, version: impl Into<String>) -> Self {
        self.default_header(API_VERSION.as_str(), version)
    }

    /// Set the default `Accept` header.
    pub fn accept(self, accept: impl Into<String>) -> Self {
        self.default_header(ACCEPT.as_str(), accept)
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Reuse an existing `reqwest` client instead of building one.
    pub fn transport(mut self, client: reqwest::Client) -> Self {
        self.transport = Some(client);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;
        let base_url = normalize_base_url(&base_url)?;

        let refresher = self
            .refresher
            .ok_or_else(|| Error::Config("token_refresher is required".to_string()))?;

        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::Config(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::Config(format!("Invalid value for header {}", name)))?;
            headers.insert(name, value);
        }

        let transport = match self.transport {
            Some(client) => client,
            None => {
                let user_agent = self
                    .user_agent
                    .unwrap_or_else(|| format!("hsdp-client/{}", env!("CARGO_PKG_VERSION")));
                reqwest::Client::builder()
                    .user_agent(user_agent)
                    .build()
                    .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?
            }
        };

        Ok(HttpClient {
            transport,
            refresher,
            base_url,
            default_headers: Arc::new(headers),
            timeout: self.timeout,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

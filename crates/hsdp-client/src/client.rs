//! Main client implementation.

use std::time::Duration;

use hsdp_oauth::SharedTokenRefresher;

use crate::api::{CdrApi, IamUserApi, TdrApi, check_fhir_id};
use crate::error::{Error, Result};
use crate::http::{DEFAULT_TIMEOUT, HttpClient};

/// HSDP platform client.
///
/// Holds one [`HttpClient`] per configured service. All of them share a
/// connection pool and a token refresher.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use hsdp_client::HsdpClient;
/// use hsdp_oauth::StaticTokenRefresher;
///
/// # async fn example() -> hsdp_client::Result<()> {
/// let client = HsdpClient::builder()
///     .idm_url("https://idm-service.example.com")
///     .token_refresher(Arc::new(StaticTokenRefresher::bearer("token")))
///     .build()?;
///
/// let users = client.iam_user()?.search_user("johndoe").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HsdpClient {
    idm: Option<HttpClient>,
    cdr: Option<(HttpClient, String)>,
    tdr: Option<HttpClient>,
}

impl HsdpClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the IAM user API.
    pub fn iam_user(&self) -> Result<IamUserApi> {
        self.idm
            .clone()
            .map(IamUserApi::new)
            .ok_or_else(|| Error::Config("idm_url is not configured".to_string()))
    }

    /// Access the CDR API.
    pub fn cdr(&self) -> Result<CdrApi> {
        self.cdr
            .clone()
            .map(|(http, organization)| CdrApi::new(http, organization))
            .ok_or_else(|| Error::Config("cdr_url is not configured".to_string()))
    }

    /// Access the TDR API.
    pub fn tdr(&self) -> Result<TdrApi> {
        self.tdr
            .clone()
            .map(TdrApi::new)
            .ok_or_else(|| Error::Config("tdr_url is not configured".to_string()))
    }
}

/// Builder for creating an [`HsdpClient`].
#[derive(Default)]
pub struct ClientBuilder {
    idm_url: Option<String>,
    cdr_url: Option<String>,
    cdr_organization: Option<String>,
    tdr_url: Option<String>,
    refresher: Option<SharedTokenRefresher>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL of the IAM identity (IDM) service.
    pub fn idm_url(mut self, url: impl Into<String>) -> Self {
        self.idm_url = Some(url.into());
        self
    }

    /// Base URL of the CDR.
    pub fn cdr_url(mut self, url: impl Into<String>) -> Self {
        self.cdr_url = Some(url.into());
        self
    }

    /// CDR organization that resource paths are scoped to.
    pub fn cdr_organization(mut self, organization: impl Into<String>) -> Self {
        self.cdr_organization = Some(organization.into());
        self
    }

    /// Base URL of the TDR.
    pub fn tdr_url(mut self, url: impl Into<String>) -> Self {
        self.tdr_url = Some(url.into());
        self
    }

    /// Set the token refresher shared by all services.
    pub fn token_refresher(mut self, refresher: SharedTokenRefresher) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Set the default call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HsdpClient> {
        let refresher = self
            .refresher
            .ok_or_else(|| Error::Config("token_refresher is required".to_string()))?;

        if self.idm_url.is_none() && self.cdr_url.is_none() && self.tdr_url.is_none() {
            return Err(Error::Config(
                "at least one service URL is required".to_string(),
            ));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("hsdp-client/{}", env!("CARGO_PKG_VERSION")));
        let transport = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let service = |url: &str| {
            HttpClient::builder()
                .base_url(url)
                .token_refresher(refresher.clone())
                .timeout(timeout)
                .transport(transport.clone())
                .build()
        };

        let idm = self.idm_url.as_deref().map(&service).transpose()?;
        let tdr = self.tdr_url.as_deref().map(&service).transpose()?;
        let cdr = match self.cdr_url.as_deref() {
            Some(url) => {
                let organization = self.cdr_organization.ok_or_else(|| {
                    Error::Config("cdr_organization is required with cdr_url".to_string())
                })?;
                check_fhir_id("CDR organization", &organization)?;
                Some((service(url)?, organization))
            }
            None => None,
        };

        Ok(HsdpClient { idm, cdr, tdr })
    }
}

//! Configuration types.
//!
//! ```toml
//! [client]
//! timeout_secs = 30
//!
//! [iam]
//! url = "https://iam-client-test.us-east.philips-healthsuite.com"
//! idm_url = "https://idm-client-test.us-east.philips-healthsuite.com"
//! client_id = "my-client"
//! username = "jane.doe@example.com"
//!
//! [cdr]
//! url = "https://cdr-stu3-sandbox.us-east.philips-healthsuite.com"
//! organization = "6a1d3ba3-1a7b-4d3f-9c55-b4e1cc2c0f3e"
//!
//! [tdr]
//! url = "https://tdr-service-client-test.us-east.philips-healthsuite.com"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Environment variable that overrides `iam.client_secret`.
pub const CLIENT_SECRET_ENV: &str = "HSDP_CLIENT_SECRET";

/// Environment variable that overrides `iam.password`.
pub const PASSWORD_ENV: &str = "HSDP_PASSWORD";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HsdpConfig {
    /// HTTP client settings.
    #[serde(default)]
    pub client: ClientSection,
    /// IAM token service and credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam: Option<IamSection>,
    /// Clinical Data Repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdr: Option<CdrSection>,
    /// Tenant Data Repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdr: Option<TdrSection>,
}

impl HsdpConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// The `[iam]` section, which every authenticated command needs.
    pub fn iam(&self) -> Result<&IamSection> {
        self.iam
            .as_ref()
            .ok_or_else(|| ConfigError::missing("iam", "config"))
    }

    /// The `[cdr]` section.
    pub fn cdr(&self) -> Result<&CdrSection> {
        self.cdr
            .as_ref()
            .ok_or_else(|| ConfigError::missing("cdr", "config"))
    }

    /// The `[tdr]` section.
    pub fn tdr(&self) -> Result<&TdrSection> {
        self.tdr
            .as_ref()
            .ok_or_else(|| ConfigError::missing("tdr", "config"))
    }

    /// Replace secrets with values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Replace secrets with values from `lookup`. Empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let Some(iam) = self.iam.as_mut() else {
            return;
        };
        let value = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(secret) = value(CLIENT_SECRET_ENV) {
            iam.client_secret = Some(secret);
        }
        if let Some(password) = value(PASSWORD_ENV) {
            iam.password = Some(password);
        }
    }
}

/// `[client]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSection {
    /// Call timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Custom user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ClientSection {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// `[iam]` section.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IamSection {
    /// IAM base URL (token endpoint).
    pub url: String,
    /// Identity service base URL (user API).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idm_url: Option<String>,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Log in with the password grant when set; otherwise client credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Refresh this many seconds before expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_margin_secs: Option<u64>,
}

impl IamSection {
    pub fn client_secret(&self) -> Result<&str> {
        self.client_secret
            .as_deref()
            .ok_or_else(|| ConfigError::missing("client_secret", "[iam]"))
    }

    /// Username and password for the password grant, if a username is set.
    pub fn password_login(&self) -> Result<Option<(&str, &str)>> {
        let Some(username) = self.username.as_deref() else {
            return Ok(None);
        };
        let password = self
            .password
            .as_deref()
            .ok_or_else(|| ConfigError::missing("password", "[iam]"))?;
        Ok(Some((username, password)))
    }

    pub fn refresh_margin(&self) -> Option<Duration> {
        self.refresh_margin_secs.map(Duration::from_secs)
    }
}

impl std::fmt::Debug for IamSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamSection")
            .field("url", &self.url)
            .field("idm_url", &self.idm_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("refresh_margin_secs", &self.refresh_margin_secs)
            .finish()
    }
}

/// `[cdr]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdrSection {
    pub url: String,
    /// CDR organization ID that resource paths are scoped to.
    pub organization: String,
}

/// `[tdr]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TdrSection {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [client]
        timeout_secs = 10
        user_agent = "hsdp-test"

        [iam]
        url = "https://iam.example.com"
        idm_url = "https://idm.example.com"
        client_id = "client"
        client_secret = "file-secret"
        username = "jane"
        password = "file-password"
        refresh_margin_secs = 120

        [cdr]
        url = "https://cdr.example.com"
        organization = "org-1"

        [tdr]
        url = "https://tdr.example.com"
    "#;

    #[test]
    fn test_parse_full() {
        let config = HsdpConfig::from_toml(FULL).unwrap();

        assert_eq!(config.client.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.client.user_agent.as_deref(), Some("hsdp-test"));

        let iam = config.iam().unwrap();
        assert_eq!(iam.idm_url.as_deref(), Some("https://idm.example.com"));
        assert_eq!(iam.client_secret().unwrap(), "file-secret");
        assert_eq!(iam.password_login().unwrap(), Some(("jane", "file-password")));
        assert_eq!(iam.refresh_margin(), Some(Duration::from_secs(120)));

        assert_eq!(config.cdr().unwrap().organization, "org-1");
        assert_eq!(config.tdr().unwrap().url, "https://tdr.example.com");
    }

    #[test]
    fn test_empty_config() {
        let config = HsdpConfig::from_toml("").unwrap();

        assert_eq!(config, HsdpConfig::new());
        assert!(matches!(
            config.iam(),
            Err(ConfigError::MissingField { ref field, .. }) if field == "iam"
        ));
        assert!(config.cdr().is_err());
        assert!(config.tdr().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let result = HsdpConfig::from_toml("[iam\nurl = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_cdr_requires_organization() {
        let result = HsdpConfig::from_toml("[cdr]\nurl = \"https://cdr\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_client_credentials_without_username() {
        let config =
            HsdpConfig::from_toml("[iam]\nurl = \"https://iam\"\nclient_id = \"c\"\n").unwrap();
        let iam = config.iam().unwrap();

        assert_eq!(iam.password_login().unwrap(), None);
        assert!(matches!(
            iam.client_secret(),
            Err(ConfigError::MissingField { ref field, .. }) if field == "client_secret"
        ));
    }

    #[test]
    fn test_username_without_password() {
        let config = HsdpConfig::from_toml(
            "[iam]\nurl = \"https://iam\"\nclient_id = \"c\"\nusername = \"jane\"\n",
        )
        .unwrap();

        assert!(config.iam().unwrap().password_login().is_err());
    }

    #[test]
    fn test_overrides_replace_secrets() {
        let mut config = HsdpConfig::from_toml(FULL).unwrap();
        config.apply_overrides_from(|name| match name {
            CLIENT_SECRET_ENV => Some("env-secret".to_string()),
            PASSWORD_ENV => Some(String::new()),
            _ => None,
        });

        let iam = config.iam().unwrap();
        assert_eq!(iam.client_secret().unwrap(), "env-secret");
        assert_eq!(iam.password.as_deref(), Some("file-password"));
    }

    #[test]
    fn test_overrides_without_iam_section() {
        let mut config = HsdpConfig::new();
        config.apply_overrides_from(|_| Some("x".to_string()));
        assert!(config.iam.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = HsdpConfig::from_toml(FULL).unwrap();
        let debug = format!("{:?}", config.iam().unwrap());

        assert!(!debug.contains("file-secret"));
        assert!(!debug.contains("file-password"));
        assert!(debug.contains("***"));
    }
}

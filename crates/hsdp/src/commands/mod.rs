//! CLI command handlers.

pub mod auth;
pub mod cdr;
pub mod tdr;
pub mod user;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use hsdp_client::HsdpClient;
use hsdp_config::HsdpConfig;
use hsdp_oauth::{CachingTokenRefresher, Grant, IamConfig, IamTokenSource};
use serde::Serialize;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration.
    pub config: HsdpConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Token source for the configured IAM client and grant.
    pub fn token_source(&self) -> Result<IamTokenSource> {
        let iam = self.config.iam()?;
        let grant = match iam.password_login()? {
            Some((username, password)) => Grant::Password {
                username: username.to_string(),
                password: password.to_string(),
            },
            None => Grant::ClientCredentials,
        };

        let mut config = IamConfig::new(&iam.url, &iam.client_id, iam.client_secret()?, grant);
        if let Some(timeout) = self.config.client.timeout() {
            config = config.timeout(timeout);
        }
        IamTokenSource::new(config).context("invalid IAM configuration")
    }

    /// Client for every service that has a config section.
    pub fn client(&self) -> Result<HsdpClient> {
        let mut refresher = CachingTokenRefresher::new(self.token_source()?);
        if let Some(margin) = self.config.iam()?.refresh_margin() {
            refresher = refresher.refresh_margin(margin);
        }

        let mut builder = HsdpClient::builder().token_refresher(Arc::new(refresher));
        if let Some(idm_url) = self.config.iam()?.idm_url.as_deref() {
            builder = builder.idm_url(idm_url);
        }
        if let Some(cdr) = &self.config.cdr {
            builder = builder
                .cdr_url(&cdr.url)
                .cdr_organization(&cdr.organization);
        }
        if let Some(tdr) = &self.config.tdr {
            builder = builder.tdr_url(&tdr.url);
        }
        if let Some(timeout) = self.config.client.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(agent) = &self.config.client.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build().context("failed to build HSDP client")
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

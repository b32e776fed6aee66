//! HTTP client SDK for the HSDP platform.
//!
//! This crate provides typed clients for HSDP IAM, the Clinical Data
//! Repository (CDR) and the Tenant Data Repository (TDR), all built on one
//! authenticated request pipeline, [`HttpClient`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hsdp_client::{HsdpClient, Result};
//! use hsdp_oauth::{CachingTokenRefresher, Grant, IamConfig, IamTokenSource};
//!
//! # async fn example() -> Result<()> {
//! let iam = IamTokenSource::new(IamConfig::new(
//!     "https://iam-service.example.com",
//!     "client-id",
//!     "client-secret",
//!     Grant::ClientCredentials,
//! ))?;
//!
//! let client = HsdpClient::builder()
//!     .idm_url("https://idm-service.example.com")
//!     .token_refresher(Arc::new(CachingTokenRefresher::new(iam)))
//!     .build()?;
//!
//! for user in client.iam_user()?.search_user("johndoe").await? {
//!     println!("{} <{}>", user.login_id, user.email_address);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Every call returns a value or exactly one [`Error`] kind: `Auth`,
//! `Timeout`, `Transport`, `Http` (non-2xx, raw body preserved) or
//! `Serialization`. No call is retried.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod request;
pub mod types;

pub use api::{CdrApi, DataItemQuery, IamUserApi, TdrApi};
pub use client::{ClientBuilder, HsdpClient};
pub use error::{Error, Result};
pub use http::{API_VERSION, ApiResponse, HttpClient, HttpClientBuilder, JSON_UTF8};
pub use request::{Body, RequestDescriptor};
pub use types::*;

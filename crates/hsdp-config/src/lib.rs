//! Configuration for the HSDP client tools.
//!
//! Provides TOML-based configuration with:
//! - Service base URLs for IAM, CDR and TDR
//! - IAM client and user credentials
//! - Secret overrides from `HSDP_CLIENT_SECRET` and `HSDP_PASSWORD`

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{config_dir, config_path, load_config, load_config_file};
pub use error::{ConfigError, Result};
pub use types::*;

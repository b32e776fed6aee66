//! Access token lifecycle for HSDP IAM.
//!
//! Every authenticated call made by the SDK needs a bearer token that is
//! valid at the moment the request goes out. This crate owns that token.
//!
//! # Components
//!
//! - [`token`]: the immutable [`Token`] value and its validity window
//! - [`refresher`]: the [`TokenRefresher`] contract and the single-flight
//!   [`CachingTokenRefresher`]
//! - [`iam`]: [`IamTokenSource`], the IAM `/authorize/oauth2/*` endpoints

pub mod error;
pub mod iam;
pub mod refresher;
pub mod token;

pub use error::{OAuthError, Result};
pub use iam::{Grant, IamConfig, IamTokenSource, Introspection};
pub use refresher::{
    CachingTokenRefresher, DEFAULT_REFRESH_MARGIN, SharedTokenRefresher, StaticTokenRefresher,
    TokenRefresher, TokenSource,
};
pub use token::Token;

//! Service API implementations.

mod cdr;
mod iam_user;
mod tdr;

pub use cdr::CdrApi;
pub(crate) use cdr::check_fhir_id;
pub use iam_user::IamUserApi;
pub use tdr::{DataItemQuery, TdrApi};

//! IAM user API.

use reqwest::header::HeaderValue;

use crate::error::Result;
use crate::http::{API_VERSION, HttpClient};
use crate::request::RequestDescriptor;
use crate::types::{User, UserSearchResponse};

const USER_PATH: &str = "authorize/identity/User";

/// IAM user API client.
#[derive(Debug, Clone)]
pub struct IamUserApi {
    http: HttpClient,
}

impl IamUserApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Search users by login ID, returning full profiles.
    pub async fn search_user(&self, login_id: &str) -> Result<Vec<User>> {
        let request = RequestDescriptor::get(USER_PATH)
            .query("userId", login_id)
            .query("profileType", "all")
            .header(API_VERSION, HeaderValue::from_static("2"));

        let response: UserSearchResponse = self.http.execute(&request).await?.json()?;
        tracing::debug!(login_id, total = response.total, "User search completed");
        Ok(response.entry)
    }
}

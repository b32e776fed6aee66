//! Clinical Data Repository (FHIR) API.

use reqwest::header::{ACCEPT, HeaderValue};

use crate::error::{Error, Result};
use crate::http::{API_VERSION, HttpClient};
use crate::request::RequestDescriptor;
use crate::types::{Format, ReadResponse, SearchResponse};

/// CDR API client, scoped to one CDR organization.
#[derive(Debug, Clone)]
pub struct CdrApi {
    http: HttpClient,
    organization: String,
}

impl CdrApi {
    pub fn new(http: HttpClient, organization: impl Into<String>) -> Self {
        Self {
            http,
            organization: organization.into(),
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Search resources of one type. Parameters are sent in the given order.
    pub async fn search(
        &self,
        resource_type: &str,
        params: &[(&str, &str)],
        format: Format,
    ) -> Result<SearchResponse> {
        let request = self
            .request(self.resource_path(resource_type)?, format)
            .query_pairs_from(params.iter().copied());

        let response = self.http.execute(&request).await?;
        Ok(SearchResponse {
            status: response.status(),
            body: response.text()?,
        })
    }

    /// Read one resource by logical ID.
    pub async fn read(&self, resource_type: &str, id: &str, format: Format) -> Result<ReadResponse> {
        check_fhir_id("resource id", id)?;

        let path = format!("{}/{}", self.resource_path(resource_type)?, id);
        let response = self.http.execute(&self.request(path, format)).await?;
        Ok(ReadResponse {
            status: response.status(),
            body: response.text()?,
        })
    }

    fn resource_path(&self, resource_type: &str) -> Result<String> {
        if resource_type.is_empty() || !resource_type.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Config(format!(
                "Invalid resource type: {:?}",
                resource_type
            )));
        }
        check_fhir_id("organization", &self.organization)?;
        Ok(format!("store/fhir/{}/{}", self.organization, resource_type))
    }

    fn request(&self, path: String, format: Format) -> RequestDescriptor {
        RequestDescriptor::get(path)
            .header(ACCEPT, HeaderValue::from_static(format.accept()))
            .header(API_VERSION, HeaderValue::from_static("1"))
    }
}

/// Longest logical id FHIR allows.
const MAX_ID_LEN: usize = 64;

/// Check a value against the FHIR id grammar: 1 to 64 of `A-Z a-z 0-9 - .`.
pub(crate) fn check_fhir_id(kind: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value.len() <= MAX_ID_LEN
        && value != "."
        && value != ".."
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.');
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!("Invalid {}: {:?}", kind, value)))
    }
}

//! Tenant Data Repository API.

use reqwest::header::HeaderValue;
use url::Url;

use crate::error::Result;
use crate::http::{API_VERSION, HttpClient};
use crate::request::RequestDescriptor;
use crate::types::{Bundle, Coding, DataItem};

const DATA_ITEM_PATH: &str = "store/tdr/DataItem";

/// Query parameters for searching data items.
#[derive(Debug, Clone)]
pub struct DataItemQuery {
    /// Owning organization (required by the TDR).
    pub organization: String,
    /// Data type as `system|code`.
    pub data_type: Coding,
    /// Restrict to one user, as `system|value`.
    pub user: Option<String>,
    /// Page size.
    pub count: Option<u32>,
}

impl DataItemQuery {
    pub fn new(organization: impl Into<String>, data_type: Coding) -> Self {
        Self {
            organization: organization.into(),
            data_type,
            user: None,
            count: None,
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("organization", self.organization.clone()),
            (
                "dataType",
                format!("{}|{}", self.data_type.system, self.data_type.code),
            ),
        ];
        if let Some(user) = &self.user {
            pairs.push(("user", user.clone()));
        }
        if let Some(count) = self.count {
            pairs.push(("_count", count.to_string()));
        }
        pairs
    }
}

/// TDR API client.
#[derive(Debug, Clone)]
pub struct TdrApi {
    http: HttpClient,
}

impl TdrApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Search data items; returns the first page.
    pub async fn search_data_items(&self, query: &DataItemQuery) -> Result<Bundle<DataItem>> {
        let request = Self::request(DATA_ITEM_PATH).query_pairs_from(query.pairs());
        self.http.execute(&request).await?.json()
    }

    /// Fetch the page after `bundle`, if the TDR announced one.
    pub async fn next_page(&self, bundle: &Bundle<DataItem>) -> Result<Option<Bundle<DataItem>>> {
        let Some(next) = bundle.next_link() else {
            return Ok(None);
        };

        let request = self.follow(next)?;
        let page = self.http.execute(&request).await?.json()?;
        Ok(Some(page))
    }

    /// Turn an absolute page link into a request relative to the base URL.
    fn follow(&self, link: &str) -> Result<RequestDescriptor> {
        let link = Url::parse(link)?;
        let base_path = self.http.base_url().path();
        let path = link.path().strip_prefix(base_path).unwrap_or(link.path());

        Ok(Self::request(path.to_string()).query_pairs_from(link.query_pairs().into_owned()))
    }

    fn request(path: impl Into<String>) -> RequestDescriptor {
        RequestDescriptor::get(path).header(API_VERSION, HeaderValue::from_static("5"))
    }
}

//! Request and response types for the HSDP service APIs.
//!
//! These types mirror the platform's JSON contracts field for field.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// IAM users
// ─────────────────────────────────────────────────────────────────────────────

/// Envelope returned by the user search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSearchResponse {
    /// Number of matching users.
    pub total: u32,
    /// Matching users.
    #[serde(default)]
    pub entry: Vec<User>,
}

/// An IAM user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub login_id: String,
    pub name: UserName,
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_communication_channel: Option<String>,
    /// Organization that manages this user.
    pub managing_organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_status: Option<PasswordStatus>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_status: Option<AccountStatus>,
    #[serde(default)]
    pub consented_apps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegations: Option<Delegations>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserName {
    pub family: String,
    pub given: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_changed_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_expires_on: Option<String>,
}

/// Membership of a user in an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_status: Option<String>,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub must_change_password: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_locked_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_locked_until: Option<String>,
    #[serde(default)]
    pub number_of_invalid_attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_invalid_attempted_on: Option<String>,
}

/// Delegations granted by and received by a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delegations {
    #[serde(default)]
    pub granted: Vec<GrantedDelegation>,
    #[serde(default)]
    pub received: Vec<ReceivedDelegation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedDelegation {
    pub delegatee_id: String,
    pub valid_from: String,
    pub valid_until: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedDelegation {
    pub delegator_id: String,
    pub valid_from: String,
    pub valid_until: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// CDR
// ─────────────────────────────────────────────────────────────────────────────

/// Representation requested from the CDR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    /// The `Accept` value for this format.
    pub fn accept(self) -> &'static str {
        match self {
            Format::Json => "application/fhir+json; fhirVersion=3.0",
            Format::Xml => "application/fhir+xml; fhirVersion=3.0",
        }
    }
}

/// Result of a CDR resource search.
///
/// The body is kept as text in the requested format; FHIR resources are
/// passed through rather than modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// HTTP status returned by the CDR.
    pub status: u16,
    /// Bundle in JSON or XML, depending on the requested format.
    pub body: String,
}

/// Result of reading a single CDR resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub status: u16,
    pub body: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// TDR
// ─────────────────────────────────────────────────────────────────────────────

/// A page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Bundle<T> {
    #[serde(default = "bundle_resource_type")]
    pub resource_type: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(default)]
    pub link: Vec<Link>,
    #[serde(default)]
    pub entry: Vec<BundleEntry<T>>,
}

fn bundle_resource_type() -> String {
    "Bundle".to_string()
}

impl<T> Bundle<T> {
    /// URL of the next page, if there is one.
    pub fn next_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|l| l.relation == Relation::Next)
            .map(|l| l.url.as_str())
    }

    /// Iterate over the resources on this page.
    pub fn resources(&self) -> impl Iterator<Item = &T> {
        self.entry.iter().map(|e| &e.resource)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    pub resource: T,
}

/// A link between bundle pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub relation: Relation,
    pub url: String,
}

/// Type of a bundle [`Link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "next")]
    Next,
    #[serde(other)]
    Other,
}

/// A code from a code system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
}

/// An identifier in some namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// A tenant data item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_user: Option<Identifier>,
    pub data_type: Coding,
    pub organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_category: Option<String>,
    /// Free-form payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Base64 encoded binary payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_next_link_ignores_unknown_relations() {
        let bundle: Bundle<serde_json::Value> = serde_json::from_str(
            r#"{
                "resourceType": "Bundle",
                "type": "searchset",
                "link": [
                    {"relation": "self", "url": "https://tdr/a"},
                    {"relation": "next", "url": "https://tdr/b"}
                ],
                "entry": []
            }"#,
        )
        .unwrap();

        assert_eq!(bundle.link[0].relation, Relation::Other);
        assert_eq!(bundle.next_link(), Some("https://tdr/b"));
        assert_eq!(bundle.resources().count(), 0);
    }

    #[test]
    fn test_bundle_without_links_or_entries() {
        let bundle: Bundle<DataItem> = serde_json::from_str(r#"{"total": 0}"#).unwrap();

        assert_eq!(bundle.resource_type, "Bundle");
        assert_eq!(bundle.next_link(), None);
        assert!(bundle.entry.is_empty());
    }

    #[test]
    fn test_user_optional_sections_default() {
        let user: User = serde_json::from_str(
            r#"{
                "id": "u1",
                "loginId": "jane",
                "name": {"family": "Doe", "given": "Jane"},
                "emailAddress": "jane@example.com",
                "managingOrganization": "org"
            }"#,
        )
        .unwrap();

        assert!(user.memberships.is_empty());
        assert!(user.delegations.is_none());
        assert!(user.account_status.is_none());
    }

    #[test]
    fn test_format_accept() {
        assert!(Format::Json.accept().starts_with("application/fhir+json"));
        assert!(Format::Xml.accept().starts_with("application/fhir+xml"));
        assert_eq!(Format::default(), Format::Json);
    }
}

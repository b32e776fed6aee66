//! IAM user, CDR and TDR APIs against a mock platform.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hsdp_client::{
    AccountStatus, Coding, DataItemQuery, Delegations, Error, Format, GrantedDelegation,
    HsdpClient, Membership, PasswordStatus, ReceivedDelegation, User, UserName,
};
use hsdp_oauth::StaticTokenRefresher;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCESS_TOKEN: &str = "22a34a6e-214c-4e3e-b85f-b4bbd1448613";

fn client(server: &MockServer) -> HsdpClient {
    HsdpClient::builder()
        .idm_url(server.uri())
        .cdr_url(server.uri())
        .cdr_organization("org-1")
        .tdr_url(server.uri())
        .token_refresher(Arc::new(StaticTokenRefresher::bearer(ACCESS_TOKEN)))
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// IAM users
// ─────────────────────────────────────────────────────────────────────────────

fn user_search_body() -> serde_json::Value {
    json!({
        "total": 1,
        "entry": [{
            "preferredLanguage": "en-US",
            "preferredCommunicationChannel": "SMS",
            "emailAddress": "john.doe@example.com",
            "phoneNumber": "06-12345678",
            "id": "5f0ab40e-0d36-4bd4-8d0b-4d8b8a6c3f11",
            "loginId": "johndoe",
            "name": {"family": "family name", "given": "given names"},
            "managingOrganization": "0c7b1c0e-9b21-4d7d-a8c0-3d1a6e2b9f42",
            "passwordStatus": {
                "passwordChangedOn": "2021-10-01T12:13:14Z",
                "passwordExpiresOn": "2021-12-01T12:13:14Z"
            },
            "memberships": [{
                "organizationId": "organization id",
                "organizationName": "organization name",
                "roles": ["role1", "role2"],
                "groups": ["group1", "group2"]
            }],
            "accountStatus": {
                "lastLoginTime": "2021-10-03T12:13:14Z",
                "mfaStatus": "mfaStatus",
                "phoneVerified": true,
                "emailVerified": false,
                "mustChangePassword": true,
                "disabled": false,
                "accountLockedOn": "2021-10-05T14:15:16Z",
                "accountLockedUntil": "2021-11-05T14:15:16Z",
                "numberOfInvalidAttempt": 3,
                "lastInvalidAttemptedOn": "2021-10-02T13:14:15Z"
            },
            "consentedApps": ["foo", "bar"],
            "delegations": {
                "granted": [{
                    "delegateeId": "delegatee1",
                    "validFrom": "2021-10-05T14:15:16Z",
                    "validUntil": "2021-10-05T14:15:16Z"
                }],
                "received": [{
                    "delegatorId": "delegator2",
                    "validFrom": "2021-10-05T14:15:16Z",
                    "validUntil": "2021-10-05T14:15:16Z"
                }]
            }
        }]
    })
}

fn expected_user() -> User {
    User {
        id: "5f0ab40e-0d36-4bd4-8d0b-4d8b8a6c3f11".to_string(),
        login_id: "johndoe".to_string(),
        name: UserName {
            family: "family name".to_string(),
            given: "given names".to_string(),
        },
        email_address: "john.doe@example.com".to_string(),
        phone_number: Some("06-12345678".to_string()),
        preferred_language: Some("en-US".to_string()),
        preferred_communication_channel: Some("SMS".to_string()),
        managing_organization: "0c7b1c0e-9b21-4d7d-a8c0-3d1a6e2b9f42".to_string(),
        password_status: Some(PasswordStatus {
            password_changed_on: Some("2021-10-01T12:13:14Z".to_string()),
            password_expires_on: Some("2021-12-01T12:13:14Z".to_string()),
        }),
        memberships: vec![Membership {
            organization_id: "organization id".to_string(),
            organization_name: Some("organization name".to_string()),
            roles: vec!["role1".to_string(), "role2".to_string()],
            groups: vec!["group1".to_string(), "group2".to_string()],
        }],
        account_status: Some(AccountStatus {
            last_login_time: Some("2021-10-03T12:13:14Z".to_string()),
            mfa_status: Some("mfaStatus".to_string()),
            phone_verified: true,
            email_verified: false,
            must_change_password: true,
            disabled: false,
            account_locked_on: Some("2021-10-05T14:15:16Z".to_string()),
            account_locked_until: Some("2021-11-05T14:15:16Z".to_string()),
            number_of_invalid_attempt: 3,
            last_invalid_attempted_on: Some("2021-10-02T13:14:15Z".to_string()),
        }),
        consented_apps: vec!["foo".to_string(), "bar".to_string()],
        delegations: Some(Delegations {
            granted: vec![GrantedDelegation {
                delegatee_id: "delegatee1".to_string(),
                valid_from: "2021-10-05T14:15:16Z".to_string(),
                valid_until: "2021-10-05T14:15:16Z".to_string(),
            }],
            received: vec![ReceivedDelegation {
                delegator_id: "delegator2".to_string(),
                valid_from: "2021-10-05T14:15:16Z".to_string(),
                valid_until: "2021-10-05T14:15:16Z".to_string(),
            }],
        }),
    }
}

#[tokio::test]
async fn search_user_parses_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/authorize/identity/User"))
        .and(query_param("userId", "johndoe"))
        .and(query_param("profileType", "all"))
        .and(header("Authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(header("Api-Version", "2"))
        .and(header("Accept", "application/json; charset=utf-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let users = client(&server)
        .iam_user()
        .unwrap()
        .search_user("johndoe")
        .await
        .unwrap();

    assert_eq!(users, vec![expected_user()]);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), Some("userId=johndoe&profileType=all"));
}

#[tokio::test]
async fn search_user_not_found_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/authorize/identity/User"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"issue":"not found"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .iam_user()
        .unwrap()
        .search_user("johndoe")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), r#"{"issue":"not found"}"#);
}

#[tokio::test]
async fn search_user_invalid_json_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"invalid json"}"#))
        .mount(&server)
        .await;

    let err = client(&server)
        .iam_user()
        .unwrap()
        .search_user("johndoe")
        .await
        .unwrap_err();

    match err {
        Error::Serialization { body, .. } => assert_eq!(body.as_ref(), br#"{"invalid json"}"#),
        other => panic!("expected serialization error, got {other:?}"),
    }
}

#[tokio::test]
async fn search_user_without_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let started = Instant::now();
    let err = client(&server)
        .iam_user()
        .unwrap()
        .search_user("johndoe")
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

// ─────────────────────────────────────────────────────────────────────────────
// CDR
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cdr_search_passes_body_through() {
    let server = MockServer::start().await;
    let bundle = r#"{"resourceType":"Bundle","type":"searchset","total":0}"#;
    Mock::given(method("GET"))
        .and(path("/store/fhir/org-1/Patient"))
        .and(query_param("family", "Doe"))
        .and(header("Api-Version", "1"))
        .and(header("Accept", "application/fhir+json; fhirVersion=3.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(bundle))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .cdr()
        .unwrap()
        .search(
            "Patient",
            &[("family", "Doe"), ("_count", "10")],
            Format::Json,
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, bundle);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), Some("family=Doe&_count=10"));
}

#[tokio::test]
async fn cdr_read_xml() {
    let server = MockServer::start().await;
    let patient = r#"<Patient xmlns="http://hl7.org/fhir"><id value="p1"/></Patient>"#;
    Mock::given(method("GET"))
        .and(path("/store/fhir/org-1/Patient/p1"))
        .and(header("Accept", "application/fhir+xml; fhirVersion=3.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(patient))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .cdr()
        .unwrap()
        .read("Patient", "p1", Format::Xml)
        .await
        .unwrap();

    assert_eq!(response.body, patient);
}

#[tokio::test]
async fn cdr_operation_outcome_is_http_error() {
    let server = MockServer::start().await;
    let outcome = r#"{"resourceType":"OperationOutcome","issue":[{"severity":"error"}]}"#;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_string(outcome))
        .mount(&server)
        .await;

    let err = client(&server)
        .cdr()
        .unwrap()
        .search("Patient", &[("bogus", "1")], Format::Json)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), outcome);
}

// ─────────────────────────────────────────────────────────────────────────────
// TDR
// ─────────────────────────────────────────────────────────────────────────────

fn data_item(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "timestamp": "2021-10-05T14:15:16Z",
        "dataType": {"system": "TDR", "code": "steps"},
        "organization": "org-1",
        "data": {"count": 42}
    })
}

#[tokio::test]
async fn tdr_search_follows_next_link() {
    let server = MockServer::start().await;
    let next = format!(
        "{}/store/tdr/DataItem?organization=org-1&dataType=TDR%7Csteps&_startAt=1",
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/store/tdr/DataItem"))
        .and(query_param("_startAt", "1"))
        .and(header("Api-Version", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 2,
            "link": [],
            "entry": [{"resource": data_item("item-2")}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/store/tdr/DataItem"))
        .and(query_param("organization", "org-1"))
        .and(query_param("dataType", "TDR|steps"))
        .and(query_param("_count", "1"))
        .and(header("Api-Version", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 2,
            "link": [{"relation": "next", "url": next}],
            "entry": [{"fullUrl": "item-1", "resource": data_item("item-1")}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tdr = client(&server).tdr().unwrap();
    let query = DataItemQuery::new(
        "org-1",
        Coding {
            system: "TDR".to_string(),
            code: "steps".to_string(),
        },
    )
    .count(1);

    let first = tdr.search_data_items(&query).await.unwrap();
    assert_eq!(first.resources().next().unwrap().id, "item-1");
    assert!(first.next_link().is_some());

    let second = tdr.next_page(&first).await.unwrap().unwrap();
    assert_eq!(second.resources().next().unwrap().id, "item-2");
    assert_eq!(second.entry[0].resource.data, Some(json!({"count": 42})));

    assert!(tdr.next_page(&second).await.unwrap().is_none());
}

// Integration tests for `ConsoleClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use s1ctl_api::types::{Envelope, ScopeRef, Site};
use s1ctl_api::{
    ApiRequest, ConfigOverrideQuery, ConsoleClient, Error, RetryPolicy, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        pause: Duration::from_millis(10),
    }
}

async fn setup() -> (MockServer, ConsoleClient) {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        retry: fast_retry(),
        ..TransportConfig::default()
    };
    let client = ConsoleClient::from_token(
        &server.uri(),
        &SecretString::from("test-token".to_owned()),
        &transport,
    )
    .unwrap();
    (server, client)
}

// ── Request shape ───────────────────────────────────────────────────

#[tokio::test]
async fn test_requests_carry_token_and_json_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/accounts"))
        .and(query_param("states", "active"))
        .and(header("Authorization", "APIToken test-token"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "name": "Acme", "licenses": {"bundles": [{"name": "core"}]}}],
            "pagination": {"totalItems": 1, "nextCursor": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = client.list_active_accounts().await.unwrap();
    assert_eq!(accounts.total_items(), 1);
    assert_eq!(accounts.data[0].bundle_names(), vec!["core"]);
}

#[tokio::test]
async fn test_custom_headers_replace_defaults() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/system/info"))
        .and(header("X-Custom", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("X-Custom", reqwest::header::HeaderValue::from_static("yes"));
    let request = ApiRequest::get("system/info").headers(headers);
    let _: Value = client.execute(&request).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_delete_exclusions_sends_ids_in_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/web/api/v2.1/exclusions"))
        .and(body_json(json!({"data": {"ids": ["1", "2"], "type": "path"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"affected": 2}})))
        .mount(&server)
        .await;

    let resp = client
        .delete_exclusions(&["1".to_owned(), "2".to_owned()], "path")
        .await
        .unwrap();
    assert_eq!(resp.data.affected, 2);
}

#[tokio::test]
async fn test_config_override_query_for_specific_version() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/config-override"))
        .and(query_param("osTypes", "linux"))
        .and(query_param("groupIds", "77"))
        .and(query_param("versionOption", "SPECIFIC"))
        .and(query_param("agentVersions", "23.4.1.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "5", "name": "tuning", "config": {"a": 1}}],
            "pagination": {"totalItems": 1, "nextCursor": null}
        })))
        .mount(&server)
        .await;

    let scope = ScopeRef::Group("77".into());
    let query = ConfigOverrideQuery {
        os_type: "linux",
        scope: &scope,
        agent_version: Some("23.4.1.1"),
    };
    let overrides = client.find_config_overrides(&query).await.unwrap();
    assert_eq!(overrides.data[0].name(), "tuning");
}

// ── Retry policy ────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_is_retried_until_success() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/sites/1/policy"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/sites/1/policy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"mitigationMode": "protect"}})))
        .mount(&server)
        .await;

    let policy = client.get_policy(&ScopeRef::Site("1".into())).await.unwrap();
    assert_eq!(policy.data["mitigationMode"], "protect");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_http_error_fails_after_three_attempts() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/groups/9/policy"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad scope"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client
        .get_policy(&ScopeRef::Group("9".into()))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.to_string(),
        "Failed to get current policy for site or group with id 9. \
         Status code: 400 Bad Request. Error: bad scope"
    );
}

#[tokio::test]
async fn test_timeout_is_not_retried() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        timeout: Duration::from_millis(200),
        retry: fast_retry(),
        ..TransportConfig::default()
    };
    let client = ConsoleClient::from_token(
        &server.uri(),
        &SecretString::from("t".to_owned()),
        &transport,
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.list_active_accounts().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "got {err:?}");
    assert!(err.to_string().starts_with("Failed to get account. Error: "));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_json_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.list_active_accounts().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
    assert!(err.to_string().starts_with("API response is no valid JSON."));
}

#[tokio::test]
async fn test_default_context_message() {
    let (server, client) = setup().await;
    let client = client.with_retry(RetryPolicy::none());

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/anything"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client
        .execute::<Value>(&ApiRequest::get("anything"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().starts_with("API call failed. Status code: 404"));
}

// ── Pagination ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_all_sites_follows_cursor() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/sites"))
        .and(query_param("cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"sites": [{"id": "2", "name": "Beta"}]},
            "pagination": {"totalItems": 2, "nextCursor": null}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"sites": [{"id": "1", "name": "Alpha"}]},
            "pagination": {"totalItems": 2, "nextCursor": "c2"}
        })))
        .mount(&server)
        .await;

    let sites: Vec<Site> = client.list_all_sites().await.unwrap();
    let names: Vec<_> = sites.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
}

#[tokio::test]
async fn test_repeated_cursor_stops_pagination() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/groups"))
        .and(query_param("cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "2", "name": "Beta", "type": "static"}],
            "pagination": {"totalItems": 2, "nextCursor": "c2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "name": "Alpha", "type": "static"}],
            "pagination": {"totalItems": 2, "nextCursor": "c2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.list_all_groups("5").await.unwrap_err();
    assert!(matches!(err, Error::StalledCursor { ref cursor } if cursor == "c2"));
}

#[tokio::test]
async fn test_find_active_sites_single_match() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/web/api/v2.1/sites"))
        .and(query_param("name", "Lab"))
        .and(query_param("state", "active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"sites": [{"id": "1", "name": "Lab", "siteType": "Paid"}], "allSites": {}},
            "pagination": {"totalItems": 1, "nextCursor": null}
        })))
        .mount(&server)
        .await;

    let found: Envelope<_> = client.find_active_sites("Lab").await.unwrap();
    assert_eq!(found.total_items(), 1);
    assert_eq!(found.data.sites[0].attribute_str("siteType"), Some("Paid"));
}

// ── Downloads ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_download_streams_to_file() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/files/agent.deb"))
        .and(header("Authorization", "APIToken test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7_u8; 4096]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("agent.deb");
    let link = format!("{}/files/agent.deb", server.uri());

    let written = client.download(&link, &dest).await.unwrap();
    assert_eq!(written, 4096);
    assert_eq!(std::fs::metadata(&dest).unwrap().len(), 4096);
}

#[tokio::test]
async fn test_download_from_other_host_omits_token() {
    let (_console, client) = setup().await;
    let mirror = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/agent.msi"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1_u8; 16]))
        .expect(1)
        .mount(&mirror)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("agent.msi");
    let link = format!("{}/files/agent.msi", mirror.uri());

    let written = client.download(&link, &dest).await.unwrap();
    assert_eq!(written, 16);

    let requests = mirror.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

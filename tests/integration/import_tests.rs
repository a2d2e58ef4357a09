//! Downstream import client against a mock API

use crate::common::*;
use sumi_sync::client::{ImportClient, ImportError, EXISTING_ITEM_NAME, UNKNOWN_ITEM_NAME};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECIPE: &str = "https://example.com/recipe/1";

#[tokio::test]
async fn test_import_sends_url_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({ "url": RECIPE })))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"name": "Pasta"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let item = import_client(&server.uri(), false)
        .import_from_url(RECIPE)
        .await
        .unwrap();

    assert_eq!(item.name, "Pasta");
    assert_eq!(item.url, RECIPE);
    assert!(!item.already_exists);
    assert!(!item.dry_run);
}

#[tokio::test]
async fn test_import_accepts_slug_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#""pasta-carbonara""#))
        .mount(&server)
        .await;

    let item = import_client(&server.uri(), false)
        .import_from_url(RECIPE)
        .await
        .unwrap();
    assert_eq!(item.name, "pasta-carbonara");
}

#[tokio::test]
async fn test_import_without_name_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let item = import_client(&server.uri(), false)
        .import_from_url(RECIPE)
        .await
        .unwrap();
    assert_eq!(item.name, UNKNOWN_ITEM_NAME);
}

#[tokio::test]
async fn test_conflict_means_already_exists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let item = import_client(&server.uri(), false)
        .import_from_url(RECIPE)
        .await
        .unwrap();
    assert!(item.already_exists);
    assert_eq!(item.name, EXISTING_ITEM_NAME);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;

    // mounted first, so it answers until exhausted
    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"name": "Third time"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let item = import_client(&server.uri(), false)
        .import_from_url(RECIPE)
        .await
        .unwrap();
    assert_eq!(item.name, "Third time");
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let result = import_client(&server.uri(), false)
        .import_from_url(RECIPE)
        .await;
    assert!(matches!(result, Err(ImportError::Http { status: 503 })));
}

#[tokio::test]
async fn test_rate_limited_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let result = import_client(&server.uri(), false)
        .import_from_url(RECIPE)
        .await;
    assert!(matches!(result, Err(ImportError::RateLimited)));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .and(body_json(serde_json::json!({ "url": RECIPE })))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .and(body_json(serde_json::json!({ "url": "https://example.com/private" })))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = import_client(&server.uri(), false);

    let result = client.import_from_url(RECIPE).await;
    assert!(matches!(result, Err(ImportError::InvalidSource { status: 400 })));

    let result = client.import_from_url("https://example.com/private").await;
    assert!(matches!(result, Err(ImportError::Unauthorized { status: 401 })));
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = downstream_config(&server.uri());
    config.timeout_secs = 1;
    let client = ImportClient::new(&config, "test-token", false).unwrap();

    let result = client.import_from_url(RECIPE).await;
    assert!(matches!(result, Err(ImportError::Timeout)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // a non-pooled server really stops listening when dropped
    let uri = {
        let server = MockServer::builder().start().await;
        server.uri()
    };

    let client = import_client(&uri, false);

    let result = client.import_from_url(RECIPE).await;
    assert!(matches!(result, Err(ImportError::Network(_))));

    assert!(client.test_connection().await.is_err());
}

#[tokio::test]
async fn test_connection_check() {
    let server = MockServer::start().await;
    mount_health(&server).await;

    assert!(import_client(&server.uri(), false).test_connection().await.is_ok());
    // the connectivity check also runs in dry-run mode
    assert!(import_client(&server.uri(), true).test_connection().await.is_ok());
}

#[tokio::test]
async fn test_connection_check_rejects_bad_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = import_client(&server.uri(), false).test_connection().await;
    assert!(matches!(result, Err(ImportError::Unauthorized { status: 403 })));
}

#[tokio::test]
async fn test_dry_run_import_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let item = import_client(&server.uri(), true)
        .import_from_url(RECIPE)
        .await
        .unwrap();
    assert!(item.dry_run);
}

#[tokio::test]
async fn test_search_returns_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("search", "soup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "page": 1,
            "items": [
                { "name": "Tomato Soup", "slug": "tomato-soup" },
                { "name": "Miso Soup", "slug": "miso-soup" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = import_client(&server.uri(), false).search("soup").await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["slug"], "tomato-soup");
}

#[tokio::test]
async fn test_search_rejects_non_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = import_client(&server.uri(), false).search("soup").await;
    assert!(matches!(result, Err(ImportError::InvalidResponse(_))));
}

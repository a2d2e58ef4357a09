//! Full sync cycles against a mock downstream

use crate::common::*;
use std::io::Write;
use sumi_sync::client::EXISTING_ITEM_NAME;
use sumi_sync::storage::{RunStatus, SqliteStorage, StateStore};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_end_to_end_imports_each_url_once() {
    let server = MockServer::start().await;
    mount_health(&server).await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#""imported-item""#))
        .expect(2)
        .mount(&server)
        .await;

    let u1 = "https://recipes.example.com/one";
    let u2 = "https://recipes.example.com/two";
    let mut coordinator = coordinator(&server, vec![url_list_source("List", &[u1, u2])], 10, false);

    let report = coordinator.run_once().await.expect("run failed");
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.discovered, 2);
    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 0);
    assert!(report.reason.is_none());

    let storage = coordinator.storage();
    let run = storage.get_run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!((run.discovered, run.imported, run.failed), (2, 2, 0));
    assert!(run.finished_at.is_some());

    for url in [u1, u2] {
        let record = storage.get_import(url).unwrap().expect("missing import record");
        assert_eq!(record.name, "imported-item");
        assert_eq!(record.source.as_deref(), Some("List"));
        assert!(storage.get_seen(url).unwrap().is_some());
    }

    // nothing new the second time around
    let second = coordinator.run_once().await.expect("second run failed");
    assert_eq!(second.status, RunStatus::Completed);
    assert_eq!(second.discovered, 2);
    assert_eq!(second.imported, 0);
    assert_eq!(second.failed, 0);

    let stats = coordinator.storage().get_stats().unwrap();
    assert_eq!(stats.total_imports, 2);
    assert_eq!(stats.runs, 2);
}

#[tokio::test]
async fn test_per_run_cap_takes_first_candidates() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    mount_import_ok(&server).await;

    let urls = [
        "https://example.com/1",
        "https://example.com/2",
        "https://example.com/3",
        "https://example.com/4",
        "https://example.com/5",
    ];
    let mut coordinator = coordinator(&server, vec![url_list_source("List", &urls)], 2, false);

    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.discovered, 5);
    assert_eq!(report.imported, 2);

    let storage = coordinator.storage();
    assert!(storage.is_imported(urls[0]).unwrap());
    assert!(storage.is_imported(urls[1]).unwrap());
    assert!(!storage.is_imported(urls[2]).unwrap());

    // the next run continues where the cap stopped
    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.imported, 2);
    assert!(coordinator.storage().is_imported(urls[2]).unwrap());
    assert!(coordinator.storage().is_imported(urls[3]).unwrap());
}

#[tokio::test]
async fn test_previously_imported_urls_are_not_sent() {
    let server = MockServer::start().await;
    mount_health(&server).await;

    let old = "https://example.com/old";
    let new = "https://example.com/new";

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .and(body_json(serde_json::json!({ "url": new })))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"name": "New"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    storage.record_import(old, "Old", Some("List")).unwrap();

    let mut coordinator = coordinator_with_storage(
        &server,
        vec![url_list_source("List", &[old, new])],
        10,
        false,
        storage,
    );

    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.discovered, 2);
    assert_eq!(report.imported, 1);
    assert_eq!(coordinator.storage().get_import(new).unwrap().unwrap().name, "New");
}

#[tokio::test]
async fn test_conflict_is_recorded_as_existing() {
    let server = MockServer::start().await;
    mount_health(&server).await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let url = "https://example.com/dupe";
    let mut coordinator = coordinator(&server, vec![url_list_source("List", &[url])], 10, false);

    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.failed, 0);

    let record = coordinator.storage().get_import(url).unwrap().unwrap();
    assert_eq!(record.name, EXISTING_ITEM_NAME);
}

#[tokio::test]
async fn test_dry_run_changes_nothing_downstream() {
    let server = MockServer::start().await;
    mount_health(&server).await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let url = "https://example.com/maybe";
    let mut coordinator = coordinator(&server, vec![url_list_source("List", &[url])], 10, true);

    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.discovered, 1);
    assert_eq!(report.imported, 0);
    assert_eq!(report.failed, 0);

    let storage = coordinator.storage();
    assert!(storage.get_import(url).unwrap().is_none());
    assert!(storage.get_attempts(url).unwrap().is_empty());
    // discovery bookkeeping still happens
    assert!(storage.get_seen(url).unwrap().is_some());
}

#[tokio::test]
async fn test_unreachable_downstream_aborts_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let url = "https://example.com/a";
    let mut coordinator = coordinator(&server, vec![url_list_source("List", &[url])], 10, false);

    let report = coordinator.run_once().await.expect("abort is not an error");
    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!((report.discovered, report.imported, report.failed), (0, 0, 0));
    assert!(report.reason.is_some());

    let run = coordinator.storage().get_run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Aborted);
    assert!(run.finished_at.is_some());
    assert!(run.failure_reason.is_some());

    // the connectivity check runs before discovery
    assert!(coordinator.storage().get_seen(url).unwrap().is_none());
}

#[tokio::test]
async fn test_failed_import_is_recorded_and_retried_later() {
    let server = MockServer::start().await;
    mount_health(&server).await;

    let good = "https://example.com/good";
    let bad = "https://example.com/bad";

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .and(body_json(serde_json::json!({ "url": bad })))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .and(body_json(serde_json::json!({ "url": good })))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"name": "Good"}"#))
        .mount(&server)
        .await;

    let mut coordinator =
        coordinator(&server, vec![url_list_source("List", &[bad, good])], 10, false);

    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.imported, 1);
    assert_eq!(report.failed, 1);

    let storage = coordinator.storage();
    assert!(!storage.is_imported(bad).unwrap());
    let attempts = storage.get_attempts(bad).unwrap();
    assert_eq!(attempts.len(), 1);
    assert!(!attempts[0].success);
    assert!(attempts[0].error_message.is_some());

    // a failed URL stays a candidate
    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(coordinator.storage().get_attempts(bad).unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_across_sources_keeps_first_source() {
    let server = MockServer::start().await;
    mount_health(&server).await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#""shared""#))
        .expect(1)
        .mount(&server)
        .await;

    let sources = vec![
        url_list_source("First", &["https://example.com/shared?utm_source=a"]),
        url_list_source("Second", &["https://example.com/shared#top"]),
    ];
    let mut coordinator = coordinator(&server, sources, 10, false);

    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.discovered, 2);
    assert_eq!(report.imported, 1);

    let record = coordinator
        .storage()
        .get_import("https://example.com/shared")
        .unwrap()
        .expect("missing import record");
    assert_eq!(record.source.as_deref(), Some("First"));
}

#[tokio::test]
async fn test_disabled_source_is_skipped() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    mount_import_ok(&server).await;

    let mut disabled = url_list_source("Off", &["https://example.com/off"]);
    disabled.enabled = false;

    let mut coordinator = coordinator(&server, vec![disabled], 10, false);
    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.discovered, 0);
    assert_eq!(report.imported, 0);
}

#[tokio::test]
async fn test_run_until_stops_on_shutdown() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    mount_import_ok(&server).await;

    let mut coordinator = coordinator(
        &server,
        vec![url_list_source("List", &["https://example.com/a"])],
        10,
        false,
    );

    coordinator.run_until(std::future::ready(())).await;

    let stats = coordinator.storage().get_stats().unwrap();
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.total_imports, 1);
}

#[tokio::test]
async fn test_reload_sources_from_file() {
    let server = MockServer::start().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[downstream]
base-url = "{}"

[output]
database-path = "./unused.db"

[[sources]]
name = "Reloaded"
type = "url-list"
urls = ["https://example.com/x"]
"#,
        server.uri()
    )
    .unwrap();

    let mut coordinator = coordinator(&server, vec![url_list_source("Initial", &[])], 10, false)
        .with_config_path(file.path());
    assert_eq!(coordinator.sources()[0].name, "Initial");

    coordinator.reload_sources();
    assert_eq!(coordinator.sources().len(), 1);
    assert_eq!(coordinator.sources()[0].name, "Reloaded");
}

#[tokio::test]
async fn test_reload_keeps_sources_on_invalid_file() {
    let server = MockServer::start().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "this is [not valid toml").unwrap();

    let mut coordinator = coordinator(&server, vec![url_list_source("Initial", &[])], 10, false)
        .with_config_path(file.path());

    coordinator.reload_sources();
    assert_eq!(coordinator.sources().len(), 1);
    assert_eq!(coordinator.sources()[0].name, "Initial");
}

#[tokio::test]
async fn test_coordinator_from_config_persists_to_disk() {
    let server = MockServer::start().await;
    mount_health(&server).await;
    mount_import_ok(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("state").join("sync.db");

    let config = sumi_sync::config::parse_config(&format!(
        r#"
[sync]
import-delay-ms = 0

[downstream]
base-url = "{}"
backoff-factor-ms = 10

[output]
database-path = "{}"

[[sources]]
name = "List"
type = "url-list"
urls = ["https://example.com/persisted"]
"#,
        server.uri(),
        db_path.display()
    ))
    .unwrap();

    let report = {
        let mut coordinator = sumi_sync::Coordinator::new(&config, "test-token").unwrap();
        coordinator.run_once().await.unwrap()
    };
    assert_eq!(report.imported, 1);

    let reopened = sumi_sync::storage::open_storage(&db_path).unwrap();
    assert!(reopened.is_imported("https://example.com/persisted").unwrap());
    assert_eq!(reopened.get_latest_run().unwrap().unwrap().id, report.run_id);
}

#[tokio::test]
async fn test_failing_source_does_not_stop_later_sources() {
    let server = MockServer::start().await;
    mount_health(&server).await;

    Mock::given(method("GET"))
        .and(path("/missing-feed.xml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#""kept""#))
        .expect(1)
        .mount(&server)
        .await;

    let broken = sumi_sync::config::SourceConfig {
        name: "Broken feed".to_string(),
        allow_domains: vec![],
        enabled: true,
        kind: sumi_sync::config::SourceKind::Rss {
            rss_url: format!("{}/missing-feed.xml", server.uri()),
            max_entries: 20,
        },
    };
    let url = "https://example.com/kept";
    let sources = vec![broken, url_list_source("List", &[url])];
    let mut coordinator = coordinator(&server, sources, 10, false);

    let report = coordinator.run_once().await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.discovered, 1);
    assert_eq!(report.imported, 1);

    let record = coordinator.storage().get_import(url).unwrap().unwrap();
    assert_eq!(record.source.as_deref(), Some("List"));
}

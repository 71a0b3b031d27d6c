use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn test_config(server: &MockServer, database_path: &Path) -> AppConfig {
    AppConfig {
        api_key: "test-key".to_string(),
        api_url: format!("{}/runPagespeed", server.uri()),
        database_path: database_path.to_path_buf(),
        targets_path: None,
        strategy: Strategy::Mobile,
        log_level: "info".to_string(),
        request_timeout_secs: 10,
        max_concurrent_requests: None,
        user_agent: "pagespeed-test/0.1".to_string(),
    }
}

fn report(performance: f64) -> serde_json::Value {
    json!({
        "lighthouseResult": {
            "categories": {
                "performance": { "score": performance },
                "accessibility": { "score": 0.9 },
                "best-practices": { "score": 0.85 },
                "seo": { "score": 0.8 }
            },
            "audits": {
                "first-contentful-paint": { "displayValue": "1.0 s" },
                "speed-index": { "displayValue": "2.0 s" },
                "interactive": { "displayValue": "3.0 s" },
                "first-meaningful-paint": { "displayValue": "1.2 s" },
                "cumulative-layout-shift": { "displayValue": "0.1" }
            }
        }
    })
}

async fn mount_report(server: &MockServer, url: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(query_param("url", url))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn stored_rows(path: &Path, table: &str) -> Vec<pagespeed_db::ResultRow> {
    let pool = pagespeed_db::open_database(path).await.unwrap();
    let rows = pagespeed_db::list_results(&pool, table).await.unwrap();
    pagespeed_db::close(&pool).await;
    rows
}

fn db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("pagespeed_results.db")
}

#[tokio::test]
async fn mixed_batch_saves_scored_targets_and_skips_failed_fetch() {
    let server = MockServer::start().await;
    // id 1 finishes last so completion order differs from id order.
    mount_report(
        &server,
        "https://a.example/",
        ResponseTemplate::new(200)
            .set_body_json(report(0.9))
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    mount_report(
        &server,
        "https://b.example/",
        ResponseTemplate::new(500).set_body_string("internal error"),
    )
    .await;
    mount_report(
        &server,
        "https://c.example/",
        ResponseTemplate::new(200).set_body_json(report(0.75)),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &db_path(&dir));
    let targets = vec![
        Target::new(1, "https://a.example/"),
        Target::new(2, "https://b.example/"),
        Target::new(3, "https://c.example/"),
    ];

    let summary = run_batch(&config, &targets).await.expect("batch should run");

    assert!(summary.table_name.starts_with("results_"));
    assert_eq!(
        summary.outcomes,
        vec![
            ItemOutcome {
                target_id: 1,
                url: "https://a.example/".to_string(),
                status: OutcomeStatus::Saved { performance: 0.9 },
            },
            ItemOutcome {
                target_id: 2,
                url: "https://b.example/".to_string(),
                status: OutcomeStatus::Skipped,
            },
            ItemOutcome {
                target_id: 3,
                url: "https://c.example/".to_string(),
                status: OutcomeStatus::Saved { performance: 0.75 },
            },
        ]
    );
    assert_eq!(
        (summary.saved(), summary.skipped(), summary.failed()),
        (2, 1, 0)
    );

    let rows = stored_rows(&config.database_path, &summary.table_name).await;
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(rows[0].url, "https://a.example/");
    assert_eq!(rows[0].strategy, "mobile");
    assert_eq!(rows[0].performance, Some(0.9));
    assert_eq!(rows[1].performance, Some(0.75));
    assert_eq!(rows[1].accessibility, Some(0.9));
    assert_eq!(rows[1].speed_index.as_deref(), Some("2.0 s"));
}

#[tokio::test]
async fn missing_audit_is_stored_as_null() {
    let server = MockServer::start().await;
    let mut body = report(0.6);
    body["lighthouseResult"]["audits"]
        .as_object_mut()
        .unwrap()
        .remove("cumulative-layout-shift");
    mount_report(
        &server,
        "https://a.example/",
        ResponseTemplate::new(200).set_body_json(body),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &db_path(&dir));
    let targets = vec![Target::new(1, "https://a.example/")];

    let summary = run_batch(&config, &targets).await.unwrap();
    let rows = stored_rows(&config.database_path, &summary.table_name).await;

    assert_eq!(rows.len(), 1);
    assert!(rows[0].cumulative_layout_shift.is_none());
    assert_eq!(rows[0].performance, Some(0.6));
    assert_eq!(rows[0].first_contentful_paint.as_deref(), Some("1.0 s"));
    assert_eq!(rows[0].interactive.as_deref(), Some("3.0 s"));
}

#[tokio::test]
async fn missing_performance_score_is_skipped() {
    let server = MockServer::start().await;
    let mut body = report(0.5);
    body["lighthouseResult"]["categories"]["performance"]["score"] = serde_json::Value::Null;
    mount_report(
        &server,
        "https://a.example/",
        ResponseTemplate::new(200).set_body_json(body),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &db_path(&dir));
    let targets = vec![Target::new(1, "https://a.example/")];

    let summary = run_batch(&config, &targets).await.unwrap();

    assert_eq!(summary.outcomes[0].status, OutcomeStatus::Skipped);
    assert!(stored_rows(&config.database_path, &summary.table_name)
        .await
        .is_empty());
}

#[tokio::test]
async fn insert_failure_does_not_stop_later_entries() {
    let server = MockServer::start().await;
    for url in ["https://a.example/", "https://b.example/", "https://c.example/"] {
        mount_report(
            &server,
            url,
            ResponseTemplate::new(200).set_body_json(report(0.8)),
        )
        .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &db_path(&dir));
    // Two entries share id 1: whichever is inserted second violates the key.
    let targets = vec![
        Target::new(1, "https://a.example/"),
        Target::new(1, "https://b.example/"),
        Target::new(2, "https://c.example/"),
    ];

    let summary = run_batch(&config, &targets).await.unwrap();

    assert_eq!(summary.outcomes.len(), 3);
    assert_eq!(summary.saved(), 2);
    assert_eq!(summary.failed(), 1);
    let failed = summary
        .outcomes
        .iter()
        .find(|o| matches!(o.status, OutcomeStatus::Failed { .. }))
        .unwrap();
    assert_eq!(failed.target_id, 1);
    assert_eq!(summary.outcomes[2].target_id, 2);
    assert_eq!(
        summary.outcomes[2].status,
        OutcomeStatus::Saved { performance: 0.8 }
    );

    let ids: Vec<i64> = stored_rows(&config.database_path, &summary.table_name)
        .await
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn undecodable_response_fails_only_that_target() {
    let server = MockServer::start().await;
    mount_report(
        &server,
        "https://a.example/",
        ResponseTemplate::new(200).set_body_string("not json"),
    )
    .await;
    mount_report(
        &server,
        "https://b.example/",
        ResponseTemplate::new(200).set_body_json(report(0.4)),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &db_path(&dir));
    let targets = vec![
        Target::new(1, "https://a.example/"),
        Target::new(2, "https://b.example/"),
    ];

    let summary = run_batch(&config, &targets).await.unwrap();

    assert!(matches!(
        summary.outcomes[0].status,
        OutcomeStatus::Failed { ref reason } if reason.contains("JSON")
    ));
    assert_eq!(
        summary.outcomes[1].status,
        OutcomeStatus::Saved { performance: 0.4 }
    );
}

#[tokio::test]
async fn bounded_concurrency_still_processes_every_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report(0.7)))
        .expect(4)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server, &db_path(&dir));
    config.max_concurrent_requests = Some(1);
    let targets: Vec<Target> = (1..=4)
        .rev()
        .map(|id| Target::new(id, format!("https://site{id}.example/")))
        .collect();

    let summary = run_batch(&config, &targets).await.unwrap();

    let ids: Vec<i64> = summary.outcomes.iter().map(|o| o.target_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(summary.saved(), 4);
}

#[tokio::test]
async fn fetch_all_sorts_by_target_id() {
    let server = MockServer::start().await;
    mount_report(
        &server,
        "https://slow.example/",
        ResponseTemplate::new(200)
            .set_body_json(report(0.1))
            .set_delay(Duration::from_millis(200)),
    )
    .await;
    mount_report(
        &server,
        "https://fast.example/",
        ResponseTemplate::new(200).set_body_json(report(0.2)),
    )
    .await;

    let client = PageSpeedClient::with_base_url(
        "test-key",
        &format!("{}/runPagespeed", server.uri()),
        10,
        "pagespeed-test/0.1",
    )
    .unwrap();
    let targets = vec![
        Target::new(2, "https://fast.example/"),
        Target::new(1, "https://slow.example/"),
    ];

    let fetched = fetch_all(&client, &targets, Strategy::Mobile, None).await;

    let ids: Vec<i64> = fetched.iter().map(|(t, _)| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(fetched[0].1.as_ref().unwrap().performance, Some(0.1));
}

#[tokio::test]
async fn unopenable_database_is_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, &dir.path().join("missing").join("results.db"));

    let result = run_batch(&config, &[Target::new(1, "https://a.example/")]).await;

    assert!(result.is_err());
}

const SLOW_TARGETS: i64 = 4;
const SLOW_DELAY: Duration = Duration::from_millis(300);

async fn slow_server() -> (MockServer, PageSpeedClient, Vec<Target>) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(report(0.5))
                .set_delay(SLOW_DELAY),
        )
        .mount(&server)
        .await;

    let client = PageSpeedClient::with_base_url(
        "test-key",
        &format!("{}/runPagespeed", server.uri()),
        10,
        "pagespeed-test/0.1",
    )
    .unwrap();
    let targets = (1..=SLOW_TARGETS)
        .map(|id| Target::new(id, format!("https://site{id}.example/")))
        .collect();

    (server, client, targets)
}

#[tokio::test]
async fn unbounded_fetch_runs_every_request_at_once() {
    let (_server, client, targets) = slow_server().await;

    let started = std::time::Instant::now();
    let fetched = fetch_all(&client, &targets, Strategy::Mobile, None).await;
    let elapsed = started.elapsed();

    assert_eq!(fetched.len(), targets.len());
    assert!(fetched.iter().all(|(_, r)| r.is_ok()));
    // Serial execution would take 4 x 300ms; full fan-out takes about one delay.
    assert!(
        elapsed < SLOW_DELAY * 3,
        "expected overlapping requests, took {elapsed:?}"
    );
}

#[tokio::test]
async fn concurrency_limit_of_one_serializes_requests() {
    let (_server, client, targets) = slow_server().await;

    let started = std::time::Instant::now();
    let fetched = fetch_all(&client, &targets, Strategy::Mobile, Some(1)).await;
    let elapsed = started.elapsed();

    assert_eq!(fetched.len(), targets.len());
    let serial = SLOW_DELAY * u32::try_from(SLOW_TARGETS).unwrap();
    assert!(
        elapsed >= serial,
        "expected one request at a time, took {elapsed:?}"
    );
}

#[tokio::test]
async fn invalid_api_url_fails_before_creating_database() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server, &db_path(&dir));
    config.api_url = "not a url".to_string();

    let result = run_batch(&config, &[Target::new(1, "https://a.example/")]).await;

    assert!(result.is_err());
    assert!(!config.database_path.exists());
}

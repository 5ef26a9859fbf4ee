//! End-to-end behaviour of the middleware pipeline and routes.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{http::StatusCode, routing::get, Router};

use monigate_gateway::app_state::AppState;
use monigate_gateway::auth::StaticCredentialStore;
use monigate_gateway::pipeline::{self, Stage, STAGES};
use monigate_gateway::router::build_router;

use common::*;

const CLIENT: [u8; 4] = [10, 0, 0, 1];

fn app_in(dir: &std::path::Path, max_requests: u32) -> (AppState, Router) {
    let state = AppState::new(test_config(dir, max_requests)).unwrap();
    let router = build_router(state.clone());
    (state, router)
}

fn app_with_sink(
    dir: &std::path::Path,
    max_requests: u32,
    sink: Arc<dyn monigate_gateway::audit::AuditSink>,
) -> (AppState, Router) {
    let cfg = test_config(dir, max_requests);
    let store = StaticCredentialStore::from_config(&cfg.credentials).unwrap();
    let state = AppState::with_parts(cfg, Arc::new(store), sink);
    let router = build_router(state.clone());
    (state, router)
}

#[tokio::test]
async fn health_is_public() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    let resp = send(&app, "/health", None, CLIENT).await;
    assert_status(&resp, StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["instance"], "test-node");
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn api_info_lists_access_classes() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    let body = json_body(send(&app, "/api/info", None, CLIENT).await).await;
    let endpoints = body["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 10);
    let audit = endpoints
        .iter()
        .find(|e| e["path"] == "/logs/audit")
        .unwrap();
    assert_eq!(audit["access"], "token:admin");
}

#[tokio::test]
async fn protected_routes_require_a_known_token() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    let resp = send(&app, "/alerts", None, CLIENT).await;
    assert_status(&resp, StatusCode::UNAUTHORIZED);
    assert!(json_body(resp).await["error"].is_string());

    let resp = send(&app, "/alerts", Some("nope"), CLIENT).await;
    assert_status(&resp, StatusCode::UNAUTHORIZED);

    let resp = send(&app, "/alerts", Some(READONLY), CLIENT).await;
    assert_status(&resp, StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["alerts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn admin_routes_check_role() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    let resp = send(&app, "/logs/system", Some(READONLY), CLIENT).await;
    assert_status(&resp, StatusCode::FORBIDDEN);

    let resp = send(&app, "/logs/audit", Some(DEVELOPER), CLIENT).await;
    assert_status(&resp, StatusCode::FORBIDDEN);

    let resp = send(&app, "/logs/system", None, CLIENT).await;
    assert_status(&resp, StatusCode::UNAUTHORIZED);

    let resp = send(&app, "/logs/system", Some(ADMIN), CLIENT).await;
    assert_status(&resp, StatusCode::OK);
}

#[tokio::test]
async fn audit_log_returns_parsed_records() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    send(&app, "/alerts", None, CLIENT).await;
    send(&app, "/health", None, CLIENT).await;

    let resp = send(&app, "/logs/audit", Some(ADMIN), CLIENT).await;
    assert_status(&resp, StatusCode::OK);
    let body = json_body(resp).await;
    let entries = body["entries"].as_array().unwrap();

    // both earlier requests plus this one, written before the handler read
    assert_eq!(entries.len(), 3);
    assert_eq!(body["count"], 3);
    assert_eq!(entries[0]["path"], "/alerts");
    assert_eq!(entries[0]["user"], "anonymous");
    assert_eq!(entries[0]["client_address"], "10.0.0.1");
    assert_eq!(entries[2]["path"], "/logs/audit");
    assert_eq!(entries[2]["user"], "alice");
}

#[tokio::test]
async fn tail_limit_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let lines: String = (1..=30).map(|i| format!("event {i}\n")).collect();
    std::fs::write(dir.path().join("security.log"), lines).unwrap();
    let (_, app) = app_in(dir.path(), 500);

    let body = json_body(send(&app, "/security?limit=5", Some(READONLY), CLIENT).await).await;
    assert_eq!(body["count"], 5);
    assert_eq!(body["events"][0], "event 26");

    let body = json_body(send(&app, "/security?limit=0", Some(READONLY), CLIENT).await).await;
    assert_eq!(body["count"], 1);

    let resp = send(&app, "/security?limit=abc", Some(READONLY), CLIENT).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_metrics_artifact_is_a_generic_500() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("metrics.json"), "{\"ok\":1}\n{broken\n").unwrap();
    let (state, app) = app_in(dir.path(), 500);

    let resp = send(&app, "/metrics", Some(DEVELOPER), CLIENT).await;
    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);
    let body = text_body(resp).await;
    assert!(body.contains("internal server error"));
    assert!(!body.contains("metrics.json"));
    assert!(!body.contains(dir.path().to_str().unwrap()));

    assert_eq!(
        state
            .metrics()
            .artifact_errors
            .get(&[("artifact", "metrics.json"), ("kind", "malformed")]),
        1
    );
}

#[tokio::test]
async fn process_health_missing_is_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    let resp = send(&app, "/health/processes", Some(READONLY), CLIENT).await;
    assert_status(&resp, StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["processes"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn rate_limit_rejects_after_threshold_per_client() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = app_in(dir.path(), 3);

    for _ in 0..3 {
        assert_status(&send(&app, "/health", None, CLIENT).await, StatusCode::OK);
    }
    let resp = send(&app, "/health", None, CLIENT).await;
    assert_status(&resp, StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("retry-after"));

    // another client has its own window
    assert_status(&send(&app, "/health", None, [10, 0, 0, 2]).await, StatusCode::OK);
    assert_eq!(state.metrics().rate_limited.get(&[]), 1);
}

#[tokio::test]
async fn prometheus_counts_one_request_under_its_labels() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = app_in(dir.path(), 500);

    send(&app, "/alerts", None, CLIENT).await;
    let labels = [("method", "GET"), ("route", "/health"), ("status_code", "200")];
    let before_series = state.metrics().http_requests.series_count();
    let before = state.metrics().http_requests.get(&labels);
    let before_401 = state
        .metrics()
        .http_requests
        .get(&[("method", "GET"), ("route", "/alerts"), ("status_code", "401")]);

    assert_status(&send(&app, "/health", None, CLIENT).await, StatusCode::OK);

    assert_eq!(state.metrics().http_requests.get(&labels), before + 1);
    assert_eq!(state.metrics().http_requests.series_count(), before_series + 1);
    assert_eq!(
        state
            .metrics()
            .http_requests
            .get(&[("method", "GET"), ("route", "/alerts"), ("status_code", "401")]),
        before_401
    );
}

#[tokio::test]
async fn prometheus_endpoint_is_public_text() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    send(&app, "/health", None, CLIENT).await;
    let resp = send(&app, "/metrics/prometheus", None, CLIENT).await;
    assert_status(&resp, StatusCode::OK);
    let ct = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(ct.starts_with("text/plain"));

    let body = text_body(resp).await;
    assert!(body.contains(
        "monigate_http_requests_total{method=\"GET\",route=\"/health\",status_code=\"200\"} 1"
    ));
    assert!(body.contains("# TYPE monigate_http_request_duration_micros histogram"));
    // the scrape itself is in flight while rendering
    assert!(body.contains("monigate_http_connections_active 1"));
    assert!(body.contains("monigate_uptime_seconds"));
}

#[tokio::test]
async fn application_metrics_reflect_traffic() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    send(&app, "/health", None, CLIENT).await;
    send(&app, "/alerts", None, CLIENT).await;

    let resp = send(&app, "/metrics/application", Some(READONLY), CLIENT).await;
    assert_status(&resp, StatusCode::OK);
    let body = json_body(resp).await;
    let m = &body["application"];
    // the in-flight request is recorded only after it completes
    assert_eq!(m["total_requests"], 2);
    assert_eq!(m["error_count"], 1);
    assert_eq!(m["error_rate_percent"], 50.0);
    assert_eq!(m["requests_per_minute"], 2);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = app_in(dir.path(), 500);

    let resp = send(&app, "/nope", None, CLIENT).await;
    assert_status(&resp, StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "not found");
    assert_eq!(
        state
            .metrics()
            .http_requests
            .get(&[("method", "GET"), ("route", "unmatched"), ("status_code", "404")]),
        1
    );
}

#[tokio::test]
async fn cors_headers_and_preflight() {
    let dir = tempfile::tempdir().unwrap();
    let (_, app) = app_in(dir.path(), 500);

    let resp = send(&app, "/health", None, CLIENT).await;
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");

    let req = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/alerts")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = tower::util::ServiceExt::oneshot(app.clone(), req).await.unwrap();
    assert_status(&resp, StatusCode::NO_CONTENT);
    let allow = resp.headers()["access-control-allow-headers"].to_str().unwrap();
    assert!(allow.contains("X-API-Token"));
}

#[tokio::test]
async fn failed_auth_is_audited_but_rate_limited_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingSink::new();
    let (_, app) = app_with_sink(dir.path(), 2, sink.clone());

    send(&app, "/alerts", Some("wrong"), CLIENT).await;
    send(&app, "/alerts", Some(ADMIN), CLIENT).await;
    let resp = send(&app, "/alerts", Some(ADMIN), CLIENT).await;
    assert_status(&resp, StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(sink.paths(), vec!["/alerts", "/alerts"]);
    assert_eq!(sink.users(), vec!["anonymous", "alice"]);
}

#[tokio::test]
async fn audit_failure_does_not_fail_the_request() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = app_with_sink(dir.path(), 500, Arc::new(BrokenSink));

    assert_status(&send(&app, "/health", None, CLIENT).await, StatusCode::OK);
    assert_eq!(state.metrics().audit_failures.get(&[("reason", "io")]), 1);
}

#[tokio::test]
async fn slow_audit_sink_is_bounded_by_the_budget() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path(), 500);
    cfg.audit.append_timeout_ms = 50;
    let store = StaticCredentialStore::from_config(&cfg.credentials).unwrap();
    let sink = SlowSink {
        delay: Duration::from_secs(2),
    };
    let state = AppState::with_parts(cfg, Arc::new(store), Arc::new(sink));
    let app = build_router(state.clone());

    let started = Instant::now();
    let resp = send(&app, "/health", None, CLIENT).await;
    let elapsed = started.elapsed();

    assert_status(&resp, StatusCode::OK);
    assert!(elapsed >= Duration::from_millis(50), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(1000), "{elapsed:?}");
    assert_eq!(state.metrics().audit_failures.get(&[("reason", "timeout")]), 1);
    assert_eq!(state.audit().pending(), 1);
}

#[test]
fn stage_order_is_fixed() {
    assert_eq!(
        STAGES,
        [
            Stage::Cors,
            Stage::RateLimit,
            Stage::Instrument,
            Stage::Audit,
            Stage::Recover
        ]
    );
}

#[tokio::test]
async fn handler_panic_becomes_generic_500_and_is_counted() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingSink::new();
    let cfg = test_config(dir.path(), 500);
    let store = StaticCredentialStore::from_config(&cfg.credentials).unwrap();
    let state = AppState::with_parts(cfg, Arc::new(store), sink.clone());

    let routes: Router<AppState> = Router::new().route("/boom", get(boom));
    let app = pipeline::apply(routes, &state).with_state(state.clone());

    let resp = send(&app, "/boom", None, CLIENT).await;
    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);
    let body = text_body(resp).await;
    assert!(body.contains("internal server error"));
    assert!(!body.contains("secret internal detail"));

    // recovery sits inside instrumentation and audit
    assert_eq!(
        state
            .metrics()
            .http_requests
            .get(&[("method", "GET"), ("route", "/boom"), ("status_code", "500")]),
        1
    );
    assert_eq!(sink.paths(), vec!["/boom"]);
    assert_eq!(state.metrics().active(), 0);
}

async fn boom() -> &'static str {
    panic!("secret internal detail")
}

mod support;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::{DownCache, FakeProbe, FakeStore, build_app, get, memory_backend, send};

#[tokio::test]
async fn health_without_host_metrics_is_still_healthy() {
    let app = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::unsupported());

    let response = get(&app.router, "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], "test-version");
    assert_eq!(body["checks"]["database"], "healthy");
    assert!(body["checks"]["system"].as_str().is_some());
    assert!(body["checks"].get("memory").is_none());
    assert!(body["timestamp"].as_str().is_some_and(|ts| ts.contains('T')));
}

#[tokio::test]
async fn health_reports_host_metrics_when_available() {
    let app = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::healthy());

    let body = get(&app.router, "/health").await.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["memory"]["usage_percent"], 42.5);
    assert_eq!(body["checks"]["memory"]["available_mb"], 512.0);
    assert_eq!(body["checks"]["disk"]["usage_percent"], 70.0);
    assert_eq!(body["checks"]["disk"]["free_gb"], 3.0);
    assert!(body["checks"].get("system").is_none());
}

#[tokio::test]
async fn host_metrics_failure_annotates_without_degrading() {
    let app = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::failing());

    let response = get(&app.router, "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(
        body["checks"]["system"]
            .as_str()
            .is_some_and(|text| text.contains("permission denied"))
    );
}

#[tokio::test]
async fn store_failure_makes_health_and_readiness_503() {
    let app = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::healthy());
    app.store.set_offline(true);

    let health = get(&app.router, "/health").await;
    assert_eq!(health.status, StatusCode::SERVICE_UNAVAILABLE);
    let body = health.json();
    assert_eq!(body["status"], "unhealthy");
    assert!(
        body["checks"]["database"]
            .as_str()
            .is_some_and(|text| text.starts_with("unhealthy: "))
    );

    let ready = get(&app.router, "/ready").await;
    assert_eq!(ready.status, StatusCode::SERVICE_UNAVAILABLE);
    let body = ready.json();
    assert_eq!(body["status"], "not ready");
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn readiness_when_store_is_up() {
    let app = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::unsupported());
    let ready = get(&app.router, "/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.json(), json!({"status": "ready"}));
}

#[tokio::test]
async fn metrics_text_with_host_metrics() {
    let app = build_app(FakeStore::with_users(3), memory_backend(), FakeProbe::healthy());
    app.store.seed_post("a", 1);
    app.store.seed_post("b", 2);

    let response = get(&app.router, "/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.content_type.as_deref(),
        Some("text/plain; version=0.0.4")
    );
    let lines: Vec<&str> = response.text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "microblog_posts_total 2",
            "microblog_users_total 3",
            "microblog_memory_usage_percent 42.5",
            "microblog_cpu_usage_percent 12.25",
        ]
    );
}

#[tokio::test]
async fn metrics_sentinels_for_missing_host_metrics() {
    let unsupported = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::unsupported());
    let text = get(&unsupported.router, "/metrics").await.text;
    assert!(text.lines().any(|line| line == "microblog_host_metrics_available 0"));
    assert!(!text.contains("microblog_cpu_usage_percent"));

    let failing = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::failing());
    let text = get(&failing.router, "/metrics").await.text;
    assert!(text.lines().any(|line| line == "microblog_system_metrics_error 1"));
}

#[tokio::test]
async fn metrics_report_store_down() {
    let app = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::healthy());
    app.store.set_offline(true);

    let response = get(&app.router, "/metrics").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.text.trim(), "microblog_store_up 0");
}

#[tokio::test]
async fn cache_info_reports_memory_backend_stats() {
    let app = build_app(FakeStore::with_users(1), memory_backend(), FakeProbe::unsupported());
    let post = app.store.seed_post("x", 1);
    let uri = format!("/posts/{}", post.id);
    get(&app.router, &uri).await;
    get(&app.router, &uri).await;

    let response = get(&app.router, "/cache/info").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["cache_type"], "Memory");
    assert_eq!(body["connected_clients"], "unknown");
    assert!(body["keyspace_hits"].as_u64().is_some_and(|hits| hits >= 1));
    assert!(body["hit_rate"].as_f64().is_some());
}

#[tokio::test]
async fn cache_admin_failures_are_500() {
    let app = build_app(FakeStore::with_users(1), Arc::new(DownCache), FakeProbe::unsupported());

    let info = get(&app.router, "/cache/info").await;
    assert_eq!(info.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        info.json()["error"]
            .as_str()
            .is_some_and(|text| text.starts_with("Could not get cache info: "))
    );

    let clear = send(&app.router, Method::POST, "/cache/clear", None).await;
    assert_eq!(clear.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        clear.json()["error"]
            .as_str()
            .is_some_and(|text| text.starts_with("Failed to clear cache: "))
    );
}

#[tokio::test]
async fn health_ignores_cache_outages() {
    let app = build_app(FakeStore::with_users(1), Arc::new(DownCache), FakeProbe::unsupported());
    assert_eq!(get(&app.router, "/health").await.status, StatusCode::OK);
    assert_eq!(get(&app.router, "/ready").await.status, StatusCode::OK);
}

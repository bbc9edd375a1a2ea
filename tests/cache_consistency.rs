//! Cache consistency of the post endpoints.
//!
//! Reads are served from the cache until a write through the API
//! invalidates the entries it could have staled. The store double counts
//! post queries so each test can tell a cache hit from a store read.

mod support;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::{DownCache, FakeProbe, FakeStore, build_app, default_app, get, send};

#[tokio::test]
async fn repeated_item_reads_hit_the_cache() {
    let app = default_app();
    let post = app.store.seed_post("cached body", 1);
    let uri = format!("/posts/{}", post.id);

    let first = get(&app.router, &uri).await.json();
    let reads_after_first = app.store.post_reads();
    let second = get(&app.router, &uri).await.json();

    assert_eq!(app.store.post_reads(), reads_after_first);
    assert_eq!(first["cached"], false);
    assert_eq!(second["cached"], true);

    let strip = |mut value: serde_json::Value| {
        if let Some(fields) = value.as_object_mut() {
            fields.remove("cached");
        }
        value
    };
    assert_eq!(strip(first), strip(second));
}

#[tokio::test]
async fn repeated_list_reads_hit_the_cache() {
    let app = default_app();
    app.store.seed_post("one", 1);

    let first = get(&app.router, "/posts?page=1&per_page=5").await.json();
    let reads = app.store.post_reads();
    let second = get(&app.router, "/posts?page=1&per_page=5").await.json();

    assert_eq!(app.store.post_reads(), reads);
    assert_eq!(first, second);
}

#[tokio::test]
async fn unrelated_writes_never_invalidate_silently() {
    let app = default_app();
    let post = app.store.seed_post("v1", 1);
    let uri = format!("/posts/{}", post.id);
    get(&app.router, &uri).await;

    // A change that bypasses the API is invisible until the entry expires.
    app.store.overwrite_body(post.id, "changed behind the cache");
    let stale = get(&app.router, &uri).await.json();
    assert_eq!(stale["body"], "v1");
    assert_eq!(stale["cached"], true);
}

#[tokio::test]
async fn update_invalidates_item_and_every_list_variant() {
    let app = default_app();
    let post = app.store.seed_post("before", 1);
    let uri = format!("/posts/{}", post.id);

    get(&app.router, &uri).await;
    for query in ["", "?page=1&per_page=5", "?per_page=20"] {
        get(&app.router, &format!("/posts{query}")).await;
    }

    let updated = send(&app.router, Method::PUT, &uri, Some(json!({"body": "after"}))).await;
    assert_eq!(updated.status, StatusCode::OK);

    let reads = app.store.post_reads();
    let item = get(&app.router, &uri).await.json();
    assert_eq!(item["body"], "after");
    assert_eq!(item["cached"], false);
    assert_eq!(app.store.post_reads(), reads + 1);

    for query in ["", "?page=1&per_page=5", "?per_page=20"] {
        let page = get(&app.router, &format!("/posts{query}")).await.json();
        assert_eq!(page["posts"][0]["body"], "after", "query {query}");
    }
}

#[tokio::test]
async fn delete_invalidates_item_and_lists() {
    let app = default_app();
    let keep = app.store.seed_post("keep", 1);
    let doomed = app.store.seed_post("doomed", 1);
    let doomed_uri = format!("/posts/{}", doomed.id);

    get(&app.router, &doomed_uri).await;
    let before = get(&app.router, "/posts").await.json();
    assert_eq!(before["total"], 2);

    let deleted = send(&app.router, Method::DELETE, &doomed_uri, None).await;
    assert_eq!(deleted.status, StatusCode::OK);

    assert_eq!(get(&app.router, &doomed_uri).await.status, StatusCode::NOT_FOUND);
    let after = get(&app.router, "/posts").await.json();
    assert_eq!(after["total"], 1);
    assert_eq!(after["posts"][0]["id"], keep.id);
}

#[tokio::test]
async fn create_invalidates_lists_but_not_items() {
    let app = default_app();
    let existing = app.store.seed_post("existing", 1);
    let existing_uri = format!("/posts/{}", existing.id);
    get(&app.router, &existing_uri).await;
    assert_eq!(get(&app.router, "/posts").await.json()["total"], 1);

    let created = send(
        &app.router,
        Method::POST,
        "/posts",
        Some(json!({"body": "fresh", "user_id": 2})),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let page = get(&app.router, "/posts").await.json();
    assert_eq!(page["total"], 2);
    assert_eq!(page["posts"][0]["body"], "fresh");
    assert_eq!(get(&app.router, &existing_uri).await.json()["cached"], true);
}

#[tokio::test]
async fn failed_writes_leave_the_cache_alone() {
    let app = default_app();
    let post = app.store.seed_post("stable", 1);
    let uri = format!("/posts/{}", post.id);
    get(&app.router, &uri).await;

    let rejected = send(&app.router, Method::PUT, &uri, Some(json!({"body": ""}))).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(get(&app.router, &uri).await.json()["cached"], true);
}

#[tokio::test]
async fn cache_clear_forces_store_reads() {
    let app = default_app();
    let post = app.store.seed_post("clear me", 1);
    let uri = format!("/posts/{}", post.id);
    get(&app.router, &uri).await;

    let cleared = send(&app.router, Method::POST, "/cache/clear", None).await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.json(), json!({"message": "Cache cleared successfully"}));

    assert_eq!(get(&app.router, &uri).await.json()["cached"], false);
}

#[tokio::test]
async fn unavailable_cache_degrades_to_the_store() {
    let store = FakeStore::with_users(1);
    let app = build_app(store, std::sync::Arc::new(DownCache), FakeProbe::unsupported());
    let post = app.store.seed_post("no cache", 1);
    let uri = format!("/posts/{}", post.id);

    for _ in 0..2 {
        let response = get(&app.router, &uri).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["cached"], false);
    }
    assert_eq!(get(&app.router, "/posts").await.status, StatusCode::OK);

    let created = send(
        &app.router,
        Method::POST,
        "/posts",
        Some(json!({"body": "still works", "user_id": 1})),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let updated = send(&app.router, Method::PUT, &uri, Some(json!({"body": "edited"}))).await;
    assert_eq!(updated.status, StatusCode::OK);
    let deleted = send(&app.router, Method::DELETE, &uri, None).await;
    assert_eq!(deleted.status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn item_entries_expire_after_their_ttl() {
    let app = default_app();
    let post = app.store.seed_post("ttl", 1);
    let uri = format!("/posts/{}", post.id);

    get(&app.router, &uri).await;
    assert_eq!(get(&app.router, &uri).await.json()["cached"], true);

    tokio::time::advance(Duration::from_secs(301)).await;
    assert_eq!(get(&app.router, &uri).await.json()["cached"], false);
}

//! In-memory doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::datetime;
use tower::ServiceExt;

use microblog::application::host::{HostMetrics, HostMetricsProbe, ProbeUnavailable};
use microblog::application::pagination::{OffsetPage, PageRequest};
use microblog::application::posts::PostService;
use microblog::application::probes::ProbeService;
use microblog::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, StoreHealth, UpdatePostParams,
    UsersRepo,
};
use microblog::application::users::UserService;
use microblog::cache::{CacheBackend, CacheConfig, CacheError, CacheStats, MemoryCache, PostCache};
use microblog::domain::entities::{PostRecord, UserRecord};
use microblog::infra::http::{ApiState, build_router};

const EPOCH: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

#[derive(Default)]
struct StoreData {
    users: Vec<UserRecord>,
    posts: BTreeMap<i64, PostRecord>,
    next_post_id: i64,
}

/// Store double that counts post reads and can be switched offline.
#[derive(Default)]
pub struct FakeStore {
    data: Mutex<StoreData>,
    post_reads: AtomicUsize,
    offline: AtomicBool,
}

impl FakeStore {
    pub fn with_users(count: i64) -> Arc<Self> {
        let store = Self::default();
        {
            let mut data = store.data.lock().expect("store lock");
            data.users = (1..=count).map(sample_user).collect();
            data.next_post_id = 1;
        }
        Arc::new(store)
    }

    /// Number of post list/get queries served so far.
    pub fn post_reads(&self) -> usize {
        self.post_reads.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Insert a post directly, bypassing the service and its invalidation.
    pub fn seed_post(&self, body: &str, user_id: i64) -> PostRecord {
        let mut data = self.data.lock().expect("store lock");
        insert_post(&mut data, body.to_string(), user_id)
    }

    /// Rewrite a post behind the cache's back.
    pub fn overwrite_body(&self, id: i64, body: &str) {
        let mut data = self.data.lock().expect("store lock");
        if let Some(post) = data.posts.get_mut(&id) {
            post.body = body.to_string();
        }
    }

    fn check_online(&self) -> Result<(), RepoError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepoError::unavailable("connection refused"));
        }
        Ok(())
    }
}

fn insert_post(data: &mut StoreData, body: String, user_id: i64) -> PostRecord {
    let id = data.next_post_id.max(1);
    data.next_post_id = id + 1;
    let post = PostRecord {
        id,
        body,
        user_id,
        timestamp: EPOCH + time::Duration::seconds(id),
    };
    data.posts.insert(id, post.clone());
    post
}

pub fn sample_user(id: i64) -> UserRecord {
    UserRecord {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        about_me: None,
        last_seen: Some(EPOCH),
    }
}

#[async_trait]
impl PostsRepo for FakeStore {
    async fn list_posts(&self, page: PageRequest) -> Result<OffsetPage<PostRecord>, RepoError> {
        self.check_online()?;
        self.post_reads.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().expect("store lock");
        let mut posts: Vec<PostRecord> = data.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        let total = posts.len() as u64;
        let items = posts
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(OffsetPage::new(items, total, page))
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        self.check_online()?;
        self.post_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.lock().expect("store lock").posts.get(&id).cloned())
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        self.check_online()?;
        Ok(self.data.lock().expect("store lock").posts.len() as u64)
    }
}

#[async_trait]
impl PostsWriteRepo for FakeStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.check_online()?;
        let mut data = self.data.lock().expect("store lock");
        Ok(insert_post(&mut data, params.body, params.user_id))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        self.check_online()?;
        let mut data = self.data.lock().expect("store lock");
        let post = data.posts.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        if let Some(body) = params.body {
            post.body = body;
        }
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        self.check_online()?;
        let mut data = self.data.lock().expect("store lock");
        data.posts.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UsersRepo for FakeStore {
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        self.check_online()?;
        Ok(self.data.lock().expect("store lock").users.clone())
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        self.check_online()?;
        let data = self.data.lock().expect("store lock");
        Ok(data.users.iter().find(|user| user.id == id).cloned())
    }

    async fn count_users(&self) -> Result<u64, RepoError> {
        self.check_online()?;
        Ok(self.data.lock().expect("store lock").users.len() as u64)
    }
}

#[async_trait]
impl StoreHealth for FakeStore {
    async fn ping(&self) -> Result<(), RepoError> {
        self.check_online()
    }
}

/// Host probe returning a fixed outcome.
pub struct FakeProbe(pub Result<HostMetrics, ProbeUnavailable>);

impl FakeProbe {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self(Ok(HostMetrics {
            memory_usage_percent: 42.5,
            memory_available_bytes: 512 * 1024 * 1024,
            cpu_usage_percent: 12.25,
            disk_usage_percent: 70.0,
            disk_free_bytes: 3 * 1024 * 1024 * 1024,
        })))
    }

    pub fn unsupported() -> Arc<Self> {
        Arc::new(Self(Err(ProbeUnavailable::NotSupported)))
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self(Err(ProbeUnavailable::Failed(
            "permission denied".to_string(),
        ))))
    }
}

#[async_trait]
impl HostMetricsProbe for FakeProbe {
    async fn try_read(&self) -> Result<HostMetrics, ProbeUnavailable> {
        self.0.clone()
    }
}

/// Cache whose every call times out.
#[derive(Default)]
pub struct DownCache;

impl DownCache {
    fn timeout(op: &'static str) -> CacheError {
        CacheError::Timeout { op, timeout_ms: 5 }
    }
}

#[async_trait]
impl CacheBackend for DownCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(Self::timeout("get"))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Err(Self::timeout("set"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(Self::timeout("delete"))
    }

    async fn incr(&self, _key: &str) -> Result<u64, CacheError> {
        Err(Self::timeout("incr"))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Err(Self::timeout("clear"))
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Err(Self::timeout("stats"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<FakeStore>,
}

pub fn memory_backend() -> Arc<dyn CacheBackend> {
    Arc::new(MemoryCache::new(&CacheConfig::default()))
}

pub fn build_app(
    store: Arc<FakeStore>,
    backend: Arc<dyn CacheBackend>,
    probe: Arc<dyn HostMetricsProbe>,
) -> TestApp {
    let config = CacheConfig::default();
    let state = ApiState {
        posts: Arc::new(PostService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            PostCache::new(backend.clone(), &config),
        )),
        users: Arc::new(UserService::new(store.clone())),
        probes: Arc::new(ProbeService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            backend,
            probe,
            "test-version",
        )),
    };
    TestApp {
        router: build_router(state),
        store,
    }
}

/// Two users, memory cache, no host metrics.
pub fn default_app() -> TestApp {
    build_app(FakeStore::with_users(2), memory_backend(), FakeProbe::unsupported())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).expect("response body should be JSON")
    }
}

pub async fn send_raw(router: &Router, method: Method, uri: &str, body: Body) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .expect("request should build");
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();

    TestResponse {
        status,
        content_type,
        text: String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
    }
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    send_raw(router, method, uri, body).await
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Method::GET, uri, None).await
}

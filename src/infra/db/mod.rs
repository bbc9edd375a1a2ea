//! Postgres-backed repository implementations.

mod posts;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    migrate::MigrateError,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{RepoError, StoreHealth};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}

#[async_trait]
impl StoreHealth for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}

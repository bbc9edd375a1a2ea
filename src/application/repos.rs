//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{OffsetPage, PageRequest};
use crate::domain::entities::{PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub body: String,
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub about_me: Option<String>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts ordered newest first. Pages past the end yield no items but
    /// still report accurate totals.
    async fn list_posts(&self, page: PageRequest) -> Result<OffsetPage<PostRecord>, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    async fn count_posts(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Returns [`RepoError::NotFound`] when no post has the given id.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Returns [`RepoError::NotFound`] when no post has the given id.
    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    async fn count_users(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait UsersWriteRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;
}

/// Minimal connectivity probe against the store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}

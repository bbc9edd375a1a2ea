//! Post reads and writes with read-through caching.
//!
//! Each read names its cache key through [`PostCache`]; each write lists the
//! entries it can stale and invalidates them after the store mutation
//! commits:
//!
//! | write  | post lists | `posts:item:id={id}` |
//! |--------|------------|----------------------|
//! | create | bumped     | untouched            |
//! | update | bumped     | deleted              |
//! | delete | bumped     | deleted              |

use std::sync::Arc;

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    application::{
        pagination::{OffsetPage, PageRequest},
        repos::{
            CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams, UsersRepo,
        },
    },
    cache::PostCache,
    domain::{entities::PostRecord, posts::PostBody},
};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("Post body is required")]
    BodyRequired,
    #[error("User ID is required")]
    UserIdRequired,
    #[error("User not found")]
    UserNotFound,
    #[error("Post body cannot be empty")]
    EmptyBody,
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("failed to encode post payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Raw fields of a create request, before validation.
#[derive(Debug, Clone, Default)]
pub struct CreatePostCommand {
    pub body: Option<Value>,
    pub user_id: Option<Value>,
}

impl CreatePostCommand {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            body: fields.get("body").cloned(),
            user_id: fields.get("user_id").cloned(),
        }
    }
}

/// Raw fields of an update request. An absent `body` leaves the post as is.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostCommand {
    pub body: Option<Value>,
}

impl UpdatePostCommand {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            body: fields.get("body").cloned(),
        }
    }
}

/// A single post payload and whether it came from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct PostLookup {
    pub payload: Value,
    pub cached: bool,
}

impl PostLookup {
    /// The payload with the `cached` marker added.
    pub fn into_body(self) -> Value {
        let mut payload = self.payload;
        if let Value::Object(fields) = &mut payload {
            fields.insert("cached".to_string(), Value::Bool(self.cached));
        }
        payload
    }
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    users: Arc<dyn UsersRepo>,
    cache: PostCache,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        users: Arc<dyn UsersRepo>,
        cache: PostCache,
    ) -> Self {
        Self {
            reader,
            writer,
            users,
            cache,
        }
    }

    /// One page of posts, newest first, as `{posts, total, pages, current_page}`.
    #[instrument(skip(self))]
    pub async fn list(&self, page: PageRequest) -> Result<Value, PostError> {
        let version = self.cache.list_version().await;
        if let Some(version) = version
            && let Some(hit) = self.cache.get_list(version, page).await
        {
            return Ok(hit);
        }

        let payload = list_payload(self.reader.list_posts(page).await?)?;
        if let Some(version) = version {
            self.cache.put_list(version, page, &payload).await;
        }
        Ok(payload)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<PostLookup, PostError> {
        if let Some(payload) = self.cache.get_item(id).await {
            return Ok(PostLookup {
                payload,
                cached: true,
            });
        }

        let post = self.reader.find_post(id).await?.ok_or(PostError::NotFound)?;
        let payload = serde_json::to_value(&post)?;
        self.cache.put_item(id, &payload).await;
        Ok(PostLookup {
            payload,
            cached: false,
        })
    }

    /// Validate in order (body, user id, user existence), insert, then
    /// orphan the cached lists.
    #[instrument(skip(self, command))]
    pub async fn create(&self, command: CreatePostCommand) -> Result<PostRecord, PostError> {
        let body = required_body(command.body)?;
        let user_id = match command.user_id {
            None | Some(Value::Null) => return Err(PostError::UserIdRequired),
            Some(raw) => parse_user_id(&raw).ok_or(PostError::UserNotFound)?,
        };
        if self.users.find_user(user_id).await?.is_none() {
            return Err(PostError::UserNotFound);
        }

        let post = self
            .writer
            .create_post(CreatePostParams {
                body: body.into_inner(),
                user_id,
            })
            .await?;
        debug!(post_id = post.id, user_id, "Created post");

        self.cache.invalidate_lists().await;
        Ok(post)
    }

    #[instrument(skip(self, command))]
    pub async fn update(&self, id: i64, command: UpdatePostCommand) -> Result<PostRecord, PostError> {
        let existing = self.reader.find_post(id).await?.ok_or(PostError::NotFound)?;

        let post = match command.body {
            None => existing,
            Some(Value::String(raw)) => {
                let body = PostBody::parse(raw).map_err(|_| PostError::EmptyBody)?;
                self.writer
                    .update_post(UpdatePostParams {
                        id,
                        body: Some(body.into_inner()),
                    })
                    .await
                    .map_err(not_found)?
            }
            Some(_) => return Err(PostError::EmptyBody),
        };

        self.invalidate_post(id).await;
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), PostError> {
        self.reader.find_post(id).await?.ok_or(PostError::NotFound)?;
        self.writer.delete_post(id).await.map_err(not_found)?;
        debug!(post_id = id, "Deleted post");

        self.invalidate_post(id).await;
        Ok(())
    }

    async fn invalidate_post(&self, id: i64) {
        self.cache.invalidate_lists().await;
        self.cache.invalidate_item(id).await;
    }
}

fn list_payload(page: OffsetPage<PostRecord>) -> Result<Value, serde_json::Error> {
    Ok(json!({
        "posts": serde_json::to_value(&page.items)?,
        "total": page.total,
        "pages": page.pages,
        "current_page": page.current_page,
    }))
}

fn required_body(raw: Option<Value>) -> Result<PostBody, PostError> {
    match raw {
        Some(Value::String(raw)) => PostBody::parse(raw).map_err(|_| PostError::BodyRequired),
        _ => Err(PostError::BodyRequired),
    }
}

/// Accepts an integer or a decimal string; anything else cannot name a user.
fn parse_user_id(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn not_found(err: RepoError) -> PostError {
    match err {
        RepoError::NotFound => PostError::NotFound,
        other => PostError::Repo(other),
    }
}

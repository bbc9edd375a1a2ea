//! Posts handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use serde_json::json;

use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

use super::{PostListQuery, json_fields, parse_id};

pub async fn list_posts(
    State(state): State<ApiState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = state.posts.list(query.page_request()).await?;
    Ok(Json(payload))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let lookup = state.posts.get(id).await?;
    Ok(Json(lookup.into_body()))
}

pub async fn create_post(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let fields = json_fields(&body)?;
    let post = state
        .posts
        .create(CreatePostCommand::from_fields(&fields))
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let fields = json_fields(&body)?;
    let post = state
        .posts
        .update(id, UpdatePostCommand::from_fields(&fields))
        .await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    state.posts.delete(id).await?;
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

use super::parse_id;

pub async fn list_users(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.users.list().await?))
}

pub async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.users.get(id).await?))
}

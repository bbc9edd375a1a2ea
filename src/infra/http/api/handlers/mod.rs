mod ops;
mod posts;
mod users;

pub use ops::{cache_info, clear_cache, health, metrics, ready};
pub use posts::{create_post, delete_post, get_post, list_posts, update_post};
pub use users::{get_user, list_users};

use axum::http::Uri;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::application::pagination::PageRequest;

use super::error::{ApiError, messages};

/// Raw list parameters; values that do not parse fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl PostListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(lenient_int(&self.page), lenient_int(&self.per_page))
    }
}

fn lenient_int(raw: &Option<String>) -> Option<i64> {
    raw.as_deref().and_then(|value| value.trim().parse().ok())
}

/// Ids that are not integers name no resource.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("`{raw}` is not a valid id")))
}

/// Decode a request body as a JSON object. An empty body reads as `{}`.
fn json_fields(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            messages::BAD_REQUEST,
            "infra::http::api::json_fields",
            "request body is not a JSON object",
        )),
        Err(err) => Err(ApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            messages::BAD_REQUEST,
            "infra::http::api::json_fields",
            err.to_string(),
        )),
    }
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}

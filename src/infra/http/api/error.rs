use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::posts::PostError;
use crate::application::repos::RepoError;
use crate::application::users::UserError;

pub mod messages {
    pub const BAD_REQUEST: &str = "Bad request";
    pub const NOT_FOUND: &str = "Resource not found";
    pub const UNAVAILABLE: &str = "Service temporarily unavailable";
    pub const INTERNAL: &str = "Internal server error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// A JSON `{"error": message}` response. The detail goes to the logs only.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    source: &'static str,
    detail: String,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        message: impl Into<String>,
        source: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            source,
            detail: detail.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            StatusCode::BAD_REQUEST,
            message.clone(),
            "infra::http::api",
            message,
        )
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            messages::NOT_FOUND,
            "infra::http::api",
            detail,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(self.source, self.status, self.detail).attach(&mut response);
        response
    }
}

pub fn repo_to_api(err: RepoError) -> ApiError {
    let source = "infra::http::api::repo_to_api";
    match err {
        RepoError::NotFound => ApiError::not_found("repository reported missing row"),
        RepoError::Timeout | RepoError::Unavailable(_) => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            messages::UNAVAILABLE,
            source,
            err.to_string(),
        ),
        RepoError::Persistence(_)
        | RepoError::Duplicate { .. }
        | RepoError::InvalidInput { .. }
        | RepoError::Integrity { .. } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            messages::INTERNAL,
            source,
            err.to_string(),
        ),
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::BodyRequired | PostError::UserIdRequired | PostError::EmptyBody => {
                ApiError::bad_request(err.to_string())
            }
            PostError::UserNotFound => ApiError::new(
                StatusCode::NOT_FOUND,
                err.to_string(),
                "infra::http::api::posts",
                "referenced user does not exist",
            ),
            PostError::NotFound => ApiError::not_found("post not found"),
            PostError::Repo(err) => repo_to_api(err),
            PostError::Encode(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::INTERNAL,
                "infra::http::api::posts",
                err.to_string(),
            ),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => ApiError::not_found("user not found"),
            UserError::MissingField { .. } => ApiError::bad_request(err.to_string()),
            UserError::Repo(err) => repo_to_api(err),
        }
    }
}

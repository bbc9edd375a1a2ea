//! Operational probes and cache administration.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::application::error::ErrorReport;
use crate::application::probes::store_down_metrics;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub async fn health(State(state): State<ApiState>) -> Response {
    let report = state.probes.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let detail = report.checks.database.clone();

    let mut response = (status, Json(report)).into_response();
    if status != StatusCode::OK {
        ErrorReport::from_message("infra::http::api::health", status, detail).attach(&mut response);
    }
    response
}

pub async fn ready(State(state): State<ApiState>) -> Response {
    match state.probes.readiness().await {
        Ok(()) => Json(json!({ "status": "ready" })).into_response(),
        Err(err) => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let body = json!({ "status": "not ready", "error": err.to_string() });
            let mut response = (status, Json(body)).into_response();
            ErrorReport::from_error("infra::http::api::ready", status, &err).attach(&mut response);
            response
        }
    }
}

pub async fn metrics(State(state): State<ApiState>) -> Response {
    match state.probes.metrics_text().await {
        Ok(text) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], text).into_response(),
        Err(err) => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let mut response = (
                status,
                [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
                store_down_metrics(),
            )
                .into_response();
            ErrorReport::from_error("infra::http::api::metrics", status, &err)
                .attach(&mut response);
            response
        }
    }
}

pub async fn cache_info(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.probes.cache_info().await.map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Could not get cache info: {err}"),
            "infra::http::api::cache_info",
            err.to_string(),
        )
    })?;
    Ok(Json(stats))
}

pub async fn clear_cache(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    state.probes.cache_clear().await.map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to clear cache: {err}"),
            "infra::http::api::clear_cache",
            err.to_string(),
        )
    })?;
    Ok(Json(json!({ "message": "Cache cleared successfully" })))
}

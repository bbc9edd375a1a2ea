use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const RESPONSE_TARGET: &str = "microblog::http::response";
const MAX_INBOUND_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Tag each request with an id, reusing a sane inbound `x-request-id`, and
/// echo it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.len() <= MAX_INBOUND_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext { request_id };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if !status.is_client_error() && !status.is_server_error() {
        debug!(
            target = RESPONSE_TARGET,
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            request_id = %request_id,
            "request served",
        );
        return response;
    }

    let (source, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = chain
        .first()
        .map(String::as_str)
        .unwrap_or("no diagnostic available");

    if status.is_server_error() {
        error!(
            target = RESPONSE_TARGET,
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            source,
            detail,
            chain = ?chain,
            request_id = %request_id,
            "request failed",
        );
    } else {
        warn!(
            target = RESPONSE_TARGET,
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            source,
            detail,
            request_id = %request_id,
            "client request error",
        );
    }

    response
}

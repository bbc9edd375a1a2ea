pub mod error;
pub mod handlers;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::{log_responses, set_request_context};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/posts/{id}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/users", get(handlers::list_users))
        .route("/users/{id}", get(handlers::get_user))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(handlers::metrics))
        .route("/cache/clear", post(handlers::clear_cache))
        .route("/cache/info", get(handlers::cache_info))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

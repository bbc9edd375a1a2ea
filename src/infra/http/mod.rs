pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router as build_router};
pub use middleware::RequestContext;

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;

use crate::infra::error::InfraError;

/// Serve `router` until `shutdown` resolves, then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), InfraError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(InfraError::from)
}

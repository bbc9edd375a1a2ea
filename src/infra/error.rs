use thiserror::Error;

/// Startup and process-level failures outside the request path.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to connect to the database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("failed to install tracing subscriber: {0}")]
    Telemetry(#[from] tracing_subscriber::util::TryInitError),
    #[error("`{key}` is not configured")]
    NotConfigured { key: &'static str },
}

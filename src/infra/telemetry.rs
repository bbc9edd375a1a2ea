use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATION, METRIC_CACHE_MISS,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

const QUIET_TARGETS: [&str; 3] = ["sqlx::query", "redis", "hyper"];

/// Install the global subscriber. `RUST_LOG` directives refine the
/// configured level; noisy dependency targets are capped at `warn`.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter(logging))
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(InfraError::from)
}

fn filter(logging: &LoggingSettings) -> EnvFilter {
    let mut filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();
    for target in QUIET_TARGETS {
        if let Ok(directive) = format!("{target}=warn").parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of cache hits, labelled by read operation."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of cache misses, labelled by read operation."
        );
        describe_counter!(
            METRIC_CACHE_ERROR,
            Unit::Count,
            "Total number of cache calls that failed and fell back to the store."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATION,
            Unit::Count,
            "Total number of cache invalidations, labelled by target."
        );
    });
}

//! Observability infrastructure - Metrics

mod config;
mod metrics;

pub use self::config::{MetricsConfig, ObservabilityConfig};
pub use self::metrics::{
    init_metrics, record_cache_lookup, record_compute_duration, LookupOutcome, PrometheusMetrics,
};

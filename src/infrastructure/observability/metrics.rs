//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

/// Prometheus metrics handle for rendering the exposition text
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics in Prometheus text format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("cache_facade_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Outcome of a single facade lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Hit,
    Miss,
    ComputeFailed,
    StoreFailed,
    Bypassed,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::ComputeFailed => "compute_failed",
            Self::StoreFailed => "store_failed",
            Self::Bypassed => "bypassed",
        }
    }
}

/// Record a facade lookup
pub fn record_cache_lookup(outcome: LookupOutcome) {
    counter!("cache_facade_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record how long a miss took to compute
pub fn record_compute_duration(duration: Duration) {
    histogram!("cache_facade_compute_duration_seconds").record(duration.as_secs_f64());
}

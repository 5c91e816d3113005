//! Observability configuration

use serde::Deserialize;

/// Main observability configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder
    #[serde(default)]
    pub enabled: bool,
}

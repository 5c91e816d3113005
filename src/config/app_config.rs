use serde::Deserialize;

use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Store selection and facade behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `in_memory` or `redis`
    pub cache_type: String,
    pub redis_url: Option<String>,
    /// Redis key prefix
    pub key_prefix: Option<String>,
    /// Facade namespace prepended to every key
    pub namespace: Option<String>,
    pub default_ttl_secs: u64,
    pub max_capacity: u64,
    pub time_to_idle_secs: Option<u64>,
    pub connection_timeout_secs: u64,
    pub max_key_length: Option<usize>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            cache_type: "in_memory".to_string(),
            redis_url: None,
            key_prefix: None,
            namespace: None,
            default_ttl_secs: 3600,
            max_capacity: 10_000,
            time_to_idle_secs: None,
            connection_timeout_secs: 5,
            max_key_length: Some(250),
            enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local` and `APP__` environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(environment())
    }

    fn load_with(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("APP")
        .separator("__")
        .try_parsing(true)
}

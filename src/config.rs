use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub ai: AiSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Profile store (artisan profiles) connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    pub profiles_collection: String,
}

/// Language-understanding service connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
}

fn default_ai_model() -> String {
    "requirement-extractor-v2".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CacheSettings {
    /// Absent means L1-only caching
    pub redis_url: Option<String>,
    pub l1_cache_size: Option<u64>,
    pub ttl_secs: Option<u64>,
}

/// Tunable matching policy
///
/// The fallback threshold encodes when the heuristic is confident enough
/// to skip the AI call; it is expected to be re-tuned over time.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: f64,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_widened_limit")]
    pub widened_limit: usize,
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            fallback_threshold: default_fallback_threshold(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            widened_limit: default_widened_limit(),
            ai_timeout_secs: default_ai_timeout_secs(),
        }
    }
}

fn default_fallback_threshold() -> f64 {
    0.6
}
fn default_limit() -> usize {
    20
}
fn default_max_limit() -> usize {
    100
}
fn default_widened_limit() -> usize {
    100
}
fn default_ai_timeout_secs() -> u64 {
    4
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsSettings {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_retention")]
    pub retention: usize,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            retention: default_retention(),
            tick_secs: default_tick_secs(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}
fn default_retention() -> usize {
    10_000
}
fn default_tick_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with ARTISAN_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with ARTISAN_)
            // e.g., ARTISAN_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("ARTISAN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("ARTISAN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply well-known environment overrides for secrets and endpoints
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let store_endpoint = env::var("ARTISAN_STORE__ENDPOINT").ok();
    let store_api_key = env::var("ARTISAN_STORE__API_KEY").ok();
    let ai_endpoint = env::var("ARTISAN_AI__ENDPOINT").ok();
    let ai_api_key = env::var("ARTISAN_AI__API_KEY").ok();
    let redis_url = env::var("REDIS_URL")
        .or_else(|_| env::var("ARTISAN_CACHE__REDIS_URL"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(endpoint) = store_endpoint {
        builder = builder.set_override("store.endpoint", endpoint)?;
    }
    if let Some(api_key) = store_api_key {
        builder = builder.set_override("store.api_key", api_key)?;
    }
    if let Some(endpoint) = ai_endpoint {
        builder = builder.set_override("ai.endpoint", endpoint)?;
    }
    if let Some(api_key) = ai_api_key {
        builder = builder.set_override("ai.api_key", api_key)?;
    }
    if let Some(url) = redis_url {
        builder = builder.set_override("cache.redis_url", url)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matching_settings() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.fallback_threshold, 0.6);
        assert_eq!(matching.default_limit, 20);
        assert_eq!(matching.max_limit, 100);
        assert_eq!(matching.widened_limit, 100);
        assert_eq!(matching.ai_timeout_secs, 4);
    }

    #[test]
    fn test_default_analytics_settings() {
        let analytics = AnalyticsSettings::default();
        assert_eq!(analytics.queue_capacity, 1024);
        assert_eq!(analytics.retention, 10_000);
        assert_eq!(analytics.tick_secs, 30);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}

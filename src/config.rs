use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::core::ScoringPolicy;
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Empty or absent disables the Redis tier
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    #[serde(default = "default_flexibility")]
    pub budget_flexibility: f64,
    #[serde(default = "default_flexibility")]
    pub size_flexibility: f64,
    #[serde(default = "default_type_weight")]
    pub type_weight: f64,
    #[serde(default = "default_history_concurrency")]
    pub history_concurrency: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
            budget_flexibility: default_flexibility(),
            size_flexibility: default_flexibility(),
            type_weight: default_type_weight(),
            history_concurrency: default_history_concurrency(),
        }
    }
}

impl MatchingSettings {
    pub fn policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            budget_flexibility: self.budget_flexibility,
            size_flexibility: self.size_flexibility,
            type_weight: self.type_weight,
        }
    }
}

fn default_parallel_threshold() -> usize { crate::core::matcher::DEFAULT_PARALLEL_THRESHOLD }
fn default_flexibility() -> f64 { 0.10 }
fn default_type_weight() -> f64 { 0.10 }
fn default_history_concurrency() -> usize { crate::core::matcher::DEFAULT_HISTORY_CONCURRENCY }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_price_weight")]
    pub price: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_area_weight")]
    pub area: f64,
    #[serde(default = "default_room_weight")]
    pub room: f64,
    #[serde(default = "default_feature_weight")]
    pub feature: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            price: default_price_weight(),
            location: default_location_weight(),
            area: default_area_weight(),
            room: default_room_weight(),
            feature: default_feature_weight(),
        }
    }
}

impl WeightsConfig {
    /// Configured fallback weights, normalized to a unit sum
    pub fn weights(&self) -> ScoringWeights {
        ScoringWeights {
            price: self.price.max(0.0),
            location: self.location.max(0.0),
            area: self.area.max(0.0),
            room: self.room.max(0.0),
            feature: self.feature.max(0.0),
        }
        .normalized(ScoringWeights::default())
    }
}

fn default_price_weight() -> f64 { 0.30 }
fn default_location_weight() -> f64 { 0.25 }
fn default_area_weight() -> f64 { 0.20 }
fn default_room_weight() -> f64 { 0.15 }
fn default_feature_weight() -> f64 { 0.10 }

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

impl LoggingSettings {
    /// Human-readable multi-line output instead of compact lines
    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ESTATE__)
    /// 5. DATABASE_URL, if set
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ESTATE__SERVER__PORT -> server.port
            .add_source(environment());

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("ESTATE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

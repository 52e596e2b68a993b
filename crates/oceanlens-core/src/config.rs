use crate::error::{OceanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically by the embedding service
    Override,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Override => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Typed engine settings resolved from a [`LayeredConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Windows longer than this many whole days are chunked
    pub max_window_days: i64,
    /// Length of each chunk in days
    pub chunk_days: i64,
    /// Per-fetch timeout
    pub fetch_timeout: Duration,
    /// Maximum number of cached query reports
    pub cache_capacity: usize,
    /// Optional time-to-live of cached reports
    pub cache_ttl: Option<Duration>,
    /// |z| at or beyond which a value is an anomaly
    pub anomaly_z_threshold: f64,
    /// Run the enhancement pipeline before analysis
    pub enhance_before_analysis: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_window_days: 365,
            chunk_days: 180,
            fetch_timeout: Duration::from_secs(30),
            cache_capacity: 128,
            cache_ttl: None,
            anomaly_z_threshold: 2.0,
            enhance_before_analysis: false,
        }
    }
}

/// Layered configuration for OceanLens
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub max_window_days: ConfigValue<i64>,
    pub chunk_days: ConfigValue<i64>,
    pub fetch_timeout_secs: ConfigValue<u64>,
    pub cache_capacity: ConfigValue<usize>,
    pub cache_ttl_secs: ConfigValue<Option<u64>>,
    pub anomaly_z_threshold: ConfigValue<f64>,
    pub enhance_before_analysis: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let defaults = EngineSettings::default();
        Self {
            max_window_days: ConfigValue::new(defaults.max_window_days, ConfigSource::Default),
            chunk_days: ConfigValue::new(defaults.chunk_days, ConfigSource::Default),
            fetch_timeout_secs: ConfigValue::new(
                defaults.fetch_timeout.as_secs(),
                ConfigSource::Default,
            ),
            cache_capacity: ConfigValue::new(defaults.cache_capacity, ConfigSource::Default),
            cache_ttl_secs: ConfigValue::new(None, ConfigSource::Default),
            anomaly_z_threshold: ConfigValue::new(
                defaults.anomaly_z_threshold,
                ConfigSource::Default,
            ),
            enhance_before_analysis: ConfigValue::new(
                defaults.enhance_before_analysis,
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| OceanError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| OceanError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(days) = file_config.max_window_days {
            self.max_window_days.update(days, ConfigSource::File);
        }

        if let Some(days) = file_config.chunk_days {
            self.chunk_days.update(days, ConfigSource::File);
        }

        if let Some(secs) = file_config.fetch_timeout_secs {
            self.fetch_timeout_secs.update(secs, ConfigSource::File);
        }

        if let Some(capacity) = file_config.cache_capacity {
            self.cache_capacity.update(capacity, ConfigSource::File);
        }

        if let Some(ttl) = file_config.cache_ttl_secs {
            self.cache_ttl_secs.update(Some(ttl), ConfigSource::File);
        }

        if let Some(threshold) = file_config.anomaly_z_threshold {
            self.anomaly_z_threshold.update(threshold, ConfigSource::File);
        }

        if let Some(enhance) = file_config.enhance_before_analysis {
            self.enhance_before_analysis.update(enhance, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Some(days) = env_value::<i64>("OCEANLENS_MAX_WINDOW_DAYS") {
            self.max_window_days.update(days, ConfigSource::Environment);
        }

        if let Some(days) = env_value::<i64>("OCEANLENS_CHUNK_DAYS") {
            self.chunk_days.update(days, ConfigSource::Environment);
        }

        if let Some(secs) = env_value::<u64>("OCEANLENS_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs.update(secs, ConfigSource::Environment);
        }

        if let Some(capacity) = env_value::<usize>("OCEANLENS_CACHE_CAPACITY") {
            self.cache_capacity.update(capacity, ConfigSource::Environment);
        }

        if let Some(ttl) = env_value::<u64>("OCEANLENS_CACHE_TTL_SECS") {
            self.cache_ttl_secs.update(Some(ttl), ConfigSource::Environment);
        }

        if let Some(threshold) = env_value::<f64>("OCEANLENS_ANOMALY_Z_THRESHOLD") {
            self.anomaly_z_threshold.update(threshold, ConfigSource::Environment);
        }

        if let Ok(raw) = env::var("OCEANLENS_ENHANCE_BEFORE_ANALYSIS") {
            match parse_bool(&raw) {
                Ok(enhance) => {
                    self.enhance_before_analysis.update(enhance, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid OCEANLENS_ENHANCE_BEFORE_ANALYSIS value '{}': expected true or false",
                    raw
                ),
            }
        }

        self
    }

    /// Apply programmatic overrides
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(days) = overrides.max_window_days {
            self.max_window_days.update(days, ConfigSource::Override);
        }

        if let Some(days) = overrides.chunk_days {
            self.chunk_days.update(days, ConfigSource::Override);
        }

        if let Some(secs) = overrides.fetch_timeout_secs {
            self.fetch_timeout_secs.update(secs, ConfigSource::Override);
        }

        if let Some(capacity) = overrides.cache_capacity {
            self.cache_capacity.update(capacity, ConfigSource::Override);
        }

        if let Some(ttl) = overrides.cache_ttl_secs {
            self.cache_ttl_secs.update(Some(ttl), ConfigSource::Override);
        }

        if let Some(threshold) = overrides.anomaly_z_threshold {
            self.anomaly_z_threshold.update(threshold, ConfigSource::Override);
        }

        if let Some(enhance) = overrides.enhance_before_analysis {
            self.enhance_before_analysis.update(enhance, ConfigSource::Override);
        }
    }

    /// Validate and convert into typed engine settings
    pub fn to_settings(&self) -> Result<EngineSettings> {
        if self.chunk_days.value <= 0 {
            return Err(OceanError::ConfigInvalid {
                key: "chunk_days".to_string(),
                reason: format!("must be positive, got {}", self.chunk_days.value),
            });
        }

        if self.max_window_days.value < self.chunk_days.value {
            return Err(OceanError::ConfigInvalid {
                key: "max_window_days".to_string(),
                reason: format!(
                    "must be at least chunk_days ({}), got {}",
                    self.chunk_days.value, self.max_window_days.value
                ),
            });
        }

        if self.fetch_timeout_secs.value == 0 {
            return Err(OceanError::ConfigInvalid {
                key: "fetch_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.cache_capacity.value == 0 {
            return Err(OceanError::ConfigInvalid {
                key: "cache_capacity".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let threshold = self.anomaly_z_threshold.value;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(OceanError::ConfigInvalid {
                key: "anomaly_z_threshold".to_string(),
                reason: format!("must be a positive number, got {}", threshold),
            });
        }

        Ok(EngineSettings {
            max_window_days: self.max_window_days.value,
            chunk_days: self.chunk_days.value,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs.value),
            cache_capacity: self.cache_capacity.value,
            cache_ttl: self.cache_ttl_secs.value.map(Duration::from_secs),
            anomaly_z_threshold: threshold,
            enhance_before_analysis: self.enhance_before_analysis.value,
        })
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "max_window_days".to_string(),
            (self.max_window_days.value.to_string(), self.max_window_days.source),
        );

        map.insert(
            "chunk_days".to_string(),
            (self.chunk_days.value.to_string(), self.chunk_days.source),
        );

        map.insert(
            "fetch_timeout_secs".to_string(),
            (self.fetch_timeout_secs.value.to_string(), self.fetch_timeout_secs.source),
        );

        map.insert(
            "cache_capacity".to_string(),
            (self.cache_capacity.value.to_string(), self.cache_capacity.source),
        );

        map.insert(
            "cache_ttl_secs".to_string(),
            (
                self.cache_ttl_secs.value.map(|v| v.to_string()).unwrap_or_else(|| "none".into()),
                self.cache_ttl_secs.source,
            ),
        );

        map.insert(
            "anomaly_z_threshold".to_string(),
            (self.anomaly_z_threshold.value.to_string(), self.anomaly_z_threshold.source),
        );

        map.insert(
            "enhance_before_analysis".to_string(),
            (self.enhance_before_analysis.value.to_string(), self.enhance_before_analysis.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    max_window_days: Option<i64>,
    chunk_days: Option<i64>,
    fetch_timeout_secs: Option<u64>,
    cache_capacity: Option<usize>,
    cache_ttl_secs: Option<u64>,
    anomaly_z_threshold: Option<f64>,
    enhance_before_analysis: Option<bool>,
}

/// Programmatic configuration overrides
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub max_window_days: Option<i64>,
    pub chunk_days: Option<i64>,
    pub fetch_timeout_secs: Option<u64>,
    pub cache_capacity: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub anomaly_z_threshold: Option<f64>,
    pub enhance_before_analysis: Option<bool>,
}

/// Parse a boolean flag from string
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(OceanError::ConfigInvalid {
            key: "bool".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}

/// Read and parse an environment variable, warning on invalid values
fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': ignoring", key, raw);
            None
        }
    }
}

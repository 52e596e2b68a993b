//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! Overrides > Environment variables > Config file > Defaults

use oceanlens_core::config::{ConfigOverrides, ConfigSource, LayeredConfig};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    for key in [
        "OCEANLENS_MAX_WINDOW_DAYS",
        "OCEANLENS_CHUNK_DAYS",
        "OCEANLENS_FETCH_TIMEOUT_SECS",
        "OCEANLENS_CACHE_CAPACITY",
        "OCEANLENS_CACHE_TTL_SECS",
        "OCEANLENS_ANOMALY_Z_THRESHOLD",
        "OCEANLENS_ENHANCE_BEFORE_ANALYSIS",
    ] {
        env::remove_var(key);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let file = config_file("chunk_days = 90\ncache_capacity = 32");

    env::set_var("OCEANLENS_CHUNK_DAYS", "30");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.chunk_days.value, 30);
    assert_eq!(config.chunk_days.source, ConfigSource::Environment);
    assert_eq!(config.cache_capacity.value, 32);
    assert_eq!(config.cache_capacity.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("OCEANLENS_FETCH_TIMEOUT_SECS", "soon");
    env::set_var("OCEANLENS_ENHANCE_BEFORE_ANALYSIS", "perhaps");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.fetch_timeout_secs.value, 30);
    assert_eq!(config.fetch_timeout_secs.source, ConfigSource::Default);
    assert!(!config.enhance_before_analysis.value);

    clear_env();
}

#[test]
#[serial]
fn test_full_precedence_chain() {
    clear_env();
    let file = config_file("cache_ttl_secs = 60\nanomaly_z_threshold = 3.0");
    env::set_var("OCEANLENS_CACHE_TTL_SECS", "120");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    config.apply_overrides(ConfigOverrides { cache_ttl_secs: Some(240), ..Default::default() });

    let settings = config.to_settings().unwrap();
    assert_eq!(settings.cache_ttl, Some(Duration::from_secs(240)));
    assert_eq!(settings.anomaly_z_threshold, 3.0);
    assert_eq!(settings.chunk_days, 180);

    clear_env();
}

#[test]
fn test_missing_file_is_config_error() {
    let err = LayeredConfig::with_defaults()
        .load_from_file("/nonexistent/oceanlens.toml")
        .unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

//! Error types for OceanLens

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OceanError {
    // Analysis errors
    #[error("Insufficient data for {analysis}: need at least {required}, found {found}")]
    InsufficientData {
        analysis: String,
        required: usize,
        found: usize,
    },

    #[error("Coverage undefined for {analysis}: {reason}")]
    CoverageUndefined { analysis: String, reason: String },

    // Query errors
    #[error("Invalid region: {reason}")]
    InvalidRegion { reason: String },

    #[error("Invalid time range: {reason}")]
    InvalidTimeRange { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // Upstream errors
    #[error("Fetch from {source_name} failed: {reason}")]
    UpstreamFetchFailure { source_name: String, reason: String },

    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OceanError {
    /// Shorthand for the most common in-band failure
    pub fn insufficient(analysis: impl Into<String>, required: usize, found: usize) -> Self {
        OceanError::InsufficientData { analysis: analysis.into(), required, found }
    }

    /// Machine-readable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OceanError::InsufficientData { .. } => ErrorKind::InsufficientData,
            OceanError::CoverageUndefined { .. } => ErrorKind::CoverageUndefined,
            OceanError::InvalidRegion { .. } => ErrorKind::InvalidRegion,
            OceanError::InvalidTimeRange { .. } => ErrorKind::InvalidTimeRange,
            OceanError::InvalidInput { .. } => ErrorKind::InvalidInput,
            OceanError::UpstreamFetchFailure { .. } => ErrorKind::UpstreamFetchFailure,
            OceanError::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            OceanError::ConfigMissing { .. } | OceanError::ConfigInvalid { .. } => {
                ErrorKind::ConfigInvalid
            }
            OceanError::Io(_) | OceanError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for OceanError {
    fn from(err: serde_json::Error) -> Self {
        OceanError::Serialization(err.to_string())
    }
}

/// Machine-readable error classification shared by fatal errors and in-band section errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    CoverageUndefined,
    InvalidRegion,
    InvalidTimeRange,
    InvalidInput,
    UpstreamFetchFailure,
    MalformedRecord,
    ConfigInvalid,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InsufficientData => "insufficient_data",
            ErrorKind::CoverageUndefined => "coverage_undefined",
            ErrorKind::InvalidRegion => "invalid_region",
            ErrorKind::InvalidTimeRange => "invalid_time_range",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::UpstreamFetchFailure => "upstream_fetch_failure",
            ErrorKind::MalformedRecord => "malformed_record",
            ErrorKind::ConfigInvalid => "config_invalid",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, OceanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(OceanError::insufficient("spatial", 3, 1).kind(), ErrorKind::InsufficientData);
        assert_eq!(
            OceanError::InvalidRegion { reason: "x".into() }.kind(),
            ErrorKind::InvalidRegion
        );
        assert_eq!(
            OceanError::ConfigMissing { key: "k".into() }.kind(),
            ErrorKind::ConfigInvalid
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UpstreamFetchFailure).unwrap();
        assert_eq!(json, "\"upstream_fetch_failure\"");
        assert_eq!(ErrorKind::InvalidTimeRange.to_string(), "invalid_time_range");
    }

    #[test]
    fn test_message_includes_counts() {
        let err = OceanError::insufficient("clustering", 3, 2);
        assert_eq!(
            err.to_string(),
            "Insufficient data for clustering: need at least 3, found 2"
        );
    }
}

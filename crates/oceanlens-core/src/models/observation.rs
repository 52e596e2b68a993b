use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::window::parse_timestamp;
use crate::error::{OceanError, Result};

/// One ocean measurement record
///
/// Coordinates are optional because upstream records occasionally arrive
/// without them. The timestamp is kept as raw text and parsed on demand so an
/// unparsable date only drops the record from time-based analyses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Upstream profile identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Latitude in degrees, [-90, 90]
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,

    /// Longitude in degrees, [-180, 180]
    #[serde(default, alias = "lon")]
    pub longitude: Option<f64>,

    /// Observation time (ISO-8601 or YYYY-MM-DD)
    #[serde(default, alias = "date")]
    pub timestamp: Option<String>,

    /// Temperature in degrees Celsius
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Practical salinity (PSU)
    #[serde(default)]
    pub salinity: Option<f64>,

    /// Depth in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,

    /// Pressure in decibars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

impl Observation {
    /// Create an observation at a position
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_salinity(mut self, salinity: f64) -> Self {
        self.salinity = Some(salinity);
        self
    }

    pub fn with_depth(mut self, depth: f64) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Both coordinates as `(latitude, longitude)`, if present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Parsed timestamp, `None` when absent or unparsable
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }

    /// Value of a measured parameter
    pub fn parameter(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Salinity => self.salinity,
            Parameter::Pressure => self.pressure,
            Parameter::Depth => self.depth,
        }
    }
}

/// Measured parameters analyses can be run over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Temperature,
    Salinity,
    Pressure,
    Depth,
}

impl Parameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Salinity => "salinity",
            Parameter::Pressure => "pressure",
            Parameter::Depth => "depth",
        }
    }
}

/// A record skipped while parsing an observation batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

/// Observations parsed from an untrusted JSON payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObservationBatch {
    pub observations: Vec<Observation>,
    pub skipped: Vec<SkippedRecord>,
}

impl ObservationBatch {
    /// Parse a JSON array of observation records.
    ///
    /// Individual records that do not fit the observation shape are skipped and
    /// reported; only a payload that is not an array fails the whole call.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let records = value.as_array().ok_or_else(|| OceanError::InvalidInput {
            reason: "observation payload must be a JSON array".to_string(),
        })?;

        let mut batch = ObservationBatch::default();
        for (index, record) in records.iter().enumerate() {
            match parse_record(index, record) {
                Ok(observation) => batch.observations.push(observation),
                Err(err) => {
                    tracing::warn!(index, error = %err, "Skipping malformed observation record");
                    let reason = match err {
                        OceanError::MalformedRecord { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    batch.skipped.push(SkippedRecord { index, reason });
                }
            }
        }

        Ok(batch)
    }

    /// Parse a JSON array from text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Self::from_json(&value)
    }
}

fn parse_record(index: usize, record: &serde_json::Value) -> Result<Observation> {
    if !record.is_object() {
        return Err(OceanError::MalformedRecord {
            index,
            reason: "record is not a JSON object".to_string(),
        });
    }

    serde_json::from_value(record.clone())
        .map_err(|e| OceanError::MalformedRecord { index, reason: e.to_string() })
}

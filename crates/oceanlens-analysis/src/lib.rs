//! OceanLens Analysis - Statistical analyzers for ocean observations
//!
//! Spatial and temporal pattern analysis, DBSCAN clustering, and the data
//! quality engine. All analyzers are pure functions of their input slice.

pub mod cluster;
pub mod quality;
pub mod spatial;
pub mod stats;
pub mod summary;
pub mod temporal;

use serde::Serialize;

pub use quality::{assess_quality, enhance_quality, EnhancementResult, QualityReport};
pub use spatial::{analyze_spatial, SpatialAnalyzer, SpatialReport};
pub use summary::{summarize, DataSummary};
pub use temporal::{analyze_temporal, TemporalAnalyzer, TemporalReport};

/// Default z-score magnitude at which a value is reported as anomalous
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// Values flagged by z-score anomaly detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport<T> {
    pub anomalies: Vec<T>,
    pub anomaly_count: usize,
    /// Flagged share of the values examined
    pub anomaly_rate: f64,
}

impl<T> AnomalyReport<T> {
    pub fn new(anomalies: Vec<T>, examined: usize) -> Self {
        let anomaly_count = anomalies.len();
        let anomaly_rate = if examined > 0 { anomaly_count as f64 / examined as f64 } else { 0.0 };
        Self { anomalies, anomaly_count, anomaly_rate }
    }
}

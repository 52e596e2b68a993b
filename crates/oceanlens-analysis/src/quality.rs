//! Data quality scoring and enhancement.
//!
//! Scoring and cleaning use different IQR multipliers: scoring flags anything
//! beyond the usual Tukey fences, cleaning only drops values far beyond them.

use std::collections::BTreeMap;

use oceanlens_core::error::OceanError;
use oceanlens_core::models::{Observation, Section};
use oceanlens_geo::planar::CoordinateExtent;
use serde::Serialize;

use crate::stats::{mean, IqrFences};

/// IQR multiplier used when scoring accuracy
pub const SCORING_IQR_MULTIPLIER: f64 = 1.5;

/// IQR multiplier used when removing outliers during enhancement
pub const CLEANING_IQR_MULTIPLIER: f64 = 3.0;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);
/// Plausible ocean temperature in degrees Celsius
pub const TEMPERATURE_RANGE: (f64, f64) = (-2.0, 40.0);
/// Plausible practical salinity
pub const SALINITY_RANGE: (f64, f64) = (0.0, 50.0);

const COMPLETENESS_THRESHOLD: f64 = 0.8;
const CONSISTENCY_PENALTY: f64 = 20.0;
const MAX_OUTLIER_RATE: f64 = 0.1;
const MIN_ACCURACY_POINTS: usize = 3;
const MIN_CLEANING_POINTS: usize = 5;

fn in_range(value: f64, (lo, hi): (f64, f64)) -> bool {
    value >= lo && value <= hi
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completeness {
    pub score: f64,
    pub completeness_rate: f64,
    pub missing_fields: usize,
    pub total_fields: usize,
    pub missing_by_field: BTreeMap<&'static str, usize>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consistency {
    pub score: f64,
    /// Out-of-range value count per field
    pub violations: BTreeMap<&'static str, usize>,
    /// Share of records whose present values are all in range
    pub valid_record_rate: f64,
    pub coordinate_valid: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accuracy {
    pub score: f64,
    pub outlier_rate: f64,
    pub outlier_count: usize,
    /// Temperatures outside the plausible range, whether or not the fences flag them
    pub implausible_count: usize,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalCoverage {
    pub score: f64,
    pub time_span_days: i64,
    pub data_points: usize,
    /// Observations per day, absent when all dates fall on one day
    pub temporal_resolution: Option<f64>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialCoverage {
    pub score: f64,
    pub lat_span: f64,
    pub lon_span: f64,
    pub spatial_extent: f64,
    pub data_density: Option<f64>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityDimensions {
    pub completeness: Completeness,
    pub consistency: Consistency,
    pub accuracy: Section<Accuracy>,
    pub temporal_coverage: TemporalCoverage,
    pub spatial_coverage: SpatialCoverage,
}

impl QualityDimensions {
    /// Scores of the dimensions that could be computed
    pub fn scores(&self) -> Vec<f64> {
        let mut scores = vec![self.completeness.score, self.consistency.score];
        if let Some(accuracy) = self.accuracy.ready() {
            scores.push(accuracy.score);
        }
        scores.push(self.temporal_coverage.score);
        scores.push(self.spatial_coverage.score);
        scores
    }

    fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.completeness.issues.iter().cloned());
        issues.extend(self.consistency.issues.iter().cloned());
        if let Some(accuracy) = self.accuracy.ready() {
            issues.extend(accuracy.issues.iter().cloned());
        }
        issues.extend(self.temporal_coverage.issues.iter().cloned());
        issues.extend(self.spatial_coverage.issues.iter().cloned());
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// Mean of the computable dimension scores, capped at the valid record share
    pub overall_quality_score: f64,
    pub issues: Vec<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<QualityDimensions>,
}

/// Score an observation set on completeness, consistency, accuracy and coverage
pub fn assess_quality(observations: &[Observation]) -> QualityReport {
    if observations.is_empty() {
        return QualityReport {
            overall_quality_score: 0.0,
            issues: vec!["No data provided".to_string()],
            dimensions: None,
        };
    }

    let dimensions = QualityDimensions {
        completeness: completeness(observations),
        consistency: consistency(observations),
        accuracy: accuracy(observations).into(),
        temporal_coverage: temporal_coverage(observations),
        spatial_coverage: spatial_coverage(observations),
    };

    // Never above the share of records with every value in range
    let ceiling = 100.0 * dimensions.consistency.valid_record_rate;
    QualityReport {
        overall_quality_score: mean(&dimensions.scores()).unwrap_or(0.0).min(ceiling),
        issues: dimensions.issues(),
        dimensions: Some(dimensions),
    }
}

fn completeness(observations: &[Observation]) -> Completeness {
    let fields: [(&'static str, fn(&Observation) -> bool); 5] = [
        ("lat", |o| o.latitude.is_some()),
        ("lon", |o| o.longitude.is_some()),
        ("temperature", |o| o.temperature.is_some()),
        ("salinity", |o| o.salinity.is_some()),
        ("date", |o| o.timestamp.is_some()),
    ];

    let missing_by_field: BTreeMap<&'static str, usize> = fields
        .iter()
        .map(|(name, present)| (*name, observations.iter().filter(|o| !present(o)).count()))
        .collect();

    let total_fields = observations.len() * fields.len();
    let missing_fields: usize = missing_by_field.values().sum();
    let completeness_rate = 1.0 - missing_fields as f64 / total_fields as f64;

    let mut issues = Vec::new();
    if completeness_rate < COMPLETENESS_THRESHOLD {
        issues.push("Missing required fields".to_string());
    }

    Completeness {
        score: completeness_rate * 100.0,
        completeness_rate,
        missing_fields,
        total_fields,
        missing_by_field,
        issues,
    }
}

fn consistency(observations: &[Observation]) -> Consistency {
    let checks: [(&'static str, fn(&Observation) -> Option<f64>, (f64, f64)); 4] = [
        ("latitude", |o| o.latitude, LATITUDE_RANGE),
        ("longitude", |o| o.longitude, LONGITUDE_RANGE),
        ("temperature", |o| o.temperature, TEMPERATURE_RANGE),
        ("salinity", |o| o.salinity, SALINITY_RANGE),
    ];

    let mut violations = BTreeMap::new();
    let mut issues = Vec::new();
    for &(name, value, range) in &checks {
        let count = observations
            .iter()
            .filter_map(value)
            .filter(|v| !in_range(*v, range))
            .count();
        if count > 0 {
            issues.push(format!(
                "{} {} values outside expected range [{}, {}]",
                count, name, range.0, range.1
            ));
            violations.insert(name, count);
        }
    }

    let valid_records = observations
        .iter()
        .filter(|&o| {
            checks
                .iter()
                .all(|&(_, value, range)| value(o).map_or(true, |v| in_range(v, range)))
        })
        .count();

    let total: usize = violations.values().sum();
    Consistency {
        score: (100.0 - total as f64 * CONSISTENCY_PENALTY).max(0.0),
        valid_record_rate: valid_records as f64 / observations.len() as f64,
        coordinate_valid: !violations.contains_key("latitude")
            && !violations.contains_key("longitude"),
        violations,
        issues,
    }
}

fn accuracy(observations: &[Observation]) -> Result<Accuracy, OceanError> {
    let temps: Vec<f64> = observations.iter().filter_map(|o| o.temperature).collect();
    if temps.len() < MIN_ACCURACY_POINTS {
        return Err(OceanError::insufficient("accuracy", MIN_ACCURACY_POINTS, temps.len()));
    }

    let fences = IqrFences::compute(&temps, SCORING_IQR_MULTIPLIER)
        .ok_or_else(|| OceanError::insufficient("accuracy", MIN_ACCURACY_POINTS, 0))?;

    let outlier_count = temps.iter().filter(|&&t| !fences.contains(t)).count();
    let implausible_count = temps.iter().filter(|&&t| !in_range(t, TEMPERATURE_RANGE)).count();

    let outlier_rate = outlier_count as f64 / temps.len() as f64;
    let mut issues = Vec::new();
    if outlier_rate > MAX_OUTLIER_RATE {
        issues.push("High outlier rate".to_string());
    }

    Ok(Accuracy {
        score: (100.0 * (1.0 - outlier_rate)).max(0.0),
        outlier_rate,
        outlier_count,
        implausible_count,
        lower_bound: fences.lower,
        upper_bound: fences.upper,
        issues,
    })
}

fn temporal_coverage(observations: &[Observation]) -> TemporalCoverage {
    let dates: Vec<_> = observations.iter().filter_map(|o| o.parsed_timestamp()).collect();
    let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
        return TemporalCoverage {
            score: 0.0,
            time_span_days: 0,
            data_points: 0,
            temporal_resolution: None,
            issues: vec!["No valid dates found".to_string()],
        };
    };

    let time_span_days = (*last - *first).num_days();
    let temporal_resolution =
        (time_span_days > 0).then(|| dates.len() as f64 / time_span_days as f64);

    let score = match temporal_resolution {
        Some(r) if r > 1.0 => 100.0,
        Some(r) if r > 0.1 => 80.0,
        Some(r) if r > 0.01 => 60.0,
        Some(_) => 40.0,
        None => 50.0,
    };

    TemporalCoverage {
        score,
        time_span_days,
        data_points: dates.len(),
        temporal_resolution,
        issues: Vec::new(),
    }
}

fn spatial_coverage(observations: &[Observation]) -> SpatialCoverage {
    let located: Vec<(f64, f64)> = observations.iter().filter_map(|o| o.coordinates()).collect();
    let Some(extent) = CoordinateExtent::from_points(located.iter().copied()) else {
        return SpatialCoverage {
            score: 0.0,
            lat_span: 0.0,
            lon_span: 0.0,
            spatial_extent: 0.0,
            data_density: None,
            issues: vec!["No valid coordinates found".to_string()],
        };
    };

    let spatial_extent = extent.diagonal();
    let score = if spatial_extent > 20.0 {
        100.0
    } else if spatial_extent > 10.0 {
        80.0
    } else if spatial_extent > 5.0 {
        60.0
    } else {
        40.0
    };

    SpatialCoverage {
        score,
        lat_span: extent.lat_span(),
        lon_span: extent.lon_span(),
        spatial_extent,
        data_density: extent.area().map(|area| located.len() as f64 / area),
        issues: Vec::new(),
    }
}

/// Cleaned copy of an observation set with a log of what changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementResult {
    pub enhanced_data: Vec<Observation>,
    pub enhancements_applied: Vec<String>,
    pub original_count: usize,
    pub enhanced_count: usize,
    pub outliers_removed: usize,
    pub coordinates_filled: usize,
    pub values_corrected: usize,
}

/// Produce a cleaned copy of `observations`.
///
/// Stages run in order: remove temperature outliers, fill missing
/// coordinates with the axis mean, clamp temperature and salinity into their
/// plausible ranges. The input slice is left untouched.
pub fn enhance_quality(observations: &[Observation]) -> EnhancementResult {
    let (kept, outliers_removed) = remove_outliers(observations.to_vec());
    let (filled, coordinates_filled) = fill_missing_coordinates(kept);
    let (enhanced_data, values_corrected) = clamp_parameters(filled);

    let mut enhancements_applied = Vec::new();
    if outliers_removed > 0 {
        enhancements_applied.push(format!("Removed {} outliers", outliers_removed));
    }
    if coordinates_filled > 0 {
        enhancements_applied.push(format!("Interpolated {} missing coordinates", coordinates_filled));
    }
    if values_corrected > 0 {
        enhancements_applied.push(format!("Corrected {} parameter values", values_corrected));
    }

    tracing::debug!(
        original = observations.len(),
        enhanced = enhanced_data.len(),
        outliers_removed,
        coordinates_filled,
        values_corrected,
        "Enhanced observation set"
    );

    EnhancementResult {
        original_count: observations.len(),
        enhanced_count: enhanced_data.len(),
        enhanced_data,
        enhancements_applied,
        outliers_removed,
        coordinates_filled,
        values_corrected,
    }
}

fn remove_outliers(data: Vec<Observation>) -> (Vec<Observation>, usize) {
    let temps: Vec<f64> = data.iter().filter_map(|o| o.temperature).collect();
    if temps.len() < MIN_CLEANING_POINTS {
        return (data, 0);
    }
    let Some(fences) = IqrFences::compute(&temps, CLEANING_IQR_MULTIPLIER) else {
        return (data, 0);
    };

    let before = data.len();
    let kept: Vec<Observation> = data
        .into_iter()
        .filter(|o| o.temperature.map(|t| fences.contains(t)).unwrap_or(true))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

fn fill_missing_coordinates(mut data: Vec<Observation>) -> (Vec<Observation>, usize) {
    let lats: Vec<f64> = data.iter().filter_map(|o| o.latitude).collect();
    let lons: Vec<f64> = data.iter().filter_map(|o| o.longitude).collect();
    let mean_lat = mean(&lats);
    let mean_lon = mean(&lons);

    let mut filled = 0;
    for o in &mut data {
        if o.latitude.is_none() {
            if let Some(lat) = mean_lat {
                o.latitude = Some(lat);
                filled += 1;
            }
        }
        if o.longitude.is_none() {
            if let Some(lon) = mean_lon {
                o.longitude = Some(lon);
                filled += 1;
            }
        }
    }
    (data, filled)
}

fn clamp_parameters(mut data: Vec<Observation>) -> (Vec<Observation>, usize) {
    fn clamp(value: &mut Option<f64>, (lo, hi): (f64, f64)) -> bool {
        match value {
            Some(v) if *v < lo || *v > hi => {
                *v = v.clamp(lo, hi);
                true
            }
            _ => false,
        }
    }

    let mut corrected = 0;
    for o in &mut data {
        corrected += usize::from(clamp(&mut o.temperature, TEMPERATURE_RANGE));
        corrected += usize::from(clamp(&mut o.salinity, SALINITY_RANGE));
    }
    (data, corrected)
}

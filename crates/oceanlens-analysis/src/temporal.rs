//! Temporal analysis of an observation set.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use oceanlens_core::error::{OceanError, Result};
use oceanlens_core::models::{format_timestamp, Observation, Section};
use serde::Serialize;

use crate::stats::{
    linear_regression, mean, percentile, population_std, population_variance, sorted, z_scores,
    SIGNIFICANCE_LEVEL,
};
use crate::{AnomalyReport, DEFAULT_Z_THRESHOLD};

const MIN_TIMESTAMPS: usize = 3;
const MIN_TREND_POINTS: usize = 3;
const MIN_ANOMALY_POINTS: usize = 5;
const MIN_VARIABILITY_POINTS: usize = 3;

/// Months that must be represented before a seasonal cycle is reported
const SEASONAL_CYCLE_MONTHS: usize = 7;

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalStatistics {
    pub start_date: String,
    pub end_date: String,
    pub time_span_days: i64,
    pub data_points: usize,
    /// Mean days between observations
    pub temporal_resolution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Northern-hemisphere meteorological season of a calendar month
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodStatistics {
    pub mean_temperature: f64,
    pub std_temperature: f64,
    pub count: usize,
}

impl PeriodStatistics {
    fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean_temperature: mean(values)?,
            std_temperature: population_std(values)?,
            count: values.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalPatterns {
    /// Keyed by calendar month (1-12)
    pub monthly_statistics: BTreeMap<u32, PeriodStatistics>,
    pub seasonal_statistics: BTreeMap<Season, PeriodStatistics>,
    pub seasonal_cycle_detected: bool,
    pub peak_month: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    /// Temperature change per second
    pub slope: f64,
    pub intercept: f64,
    pub trend_per_year: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub std_err: f64,
    pub significant_trend: bool,
    pub trend_direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalAnomaly {
    pub date: String,
    pub value: f64,
    pub z_score: f64,
    pub anomaly_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variability {
    /// Standard deviation over mean; absent when the mean is zero
    pub coefficient_of_variation: Option<f64>,
    pub range: f64,
    pub interquartile_range: f64,
    pub variance: f64,
    pub standard_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalReport {
    pub temporal_statistics: TemporalStatistics,
    pub seasonal_patterns: Section<SeasonalPatterns>,
    pub trend_analysis: Section<TrendAnalysis>,
    pub anomaly_detection: Section<AnomalyReport<TemporalAnomaly>>,
    pub variability_analysis: Section<Variability>,
}

/// Temporal analyzer with a configurable anomaly threshold
#[derive(Debug, Clone, Copy)]
pub struct TemporalAnalyzer {
    z_threshold: f64,
}

impl Default for TemporalAnalyzer {
    fn default() -> Self {
        Self { z_threshold: DEFAULT_Z_THRESHOLD }
    }
}

impl TemporalAnalyzer {
    pub fn new(z_threshold: f64) -> Self {
        Self { z_threshold }
    }

    /// Analyze temporal patterns.
    ///
    /// Records whose timestamp is missing or unparsable are skipped; the call
    /// fails when fewer than three timestamps remain.
    pub fn analyze(&self, observations: &[Observation]) -> Result<TemporalReport> {
        let dated: Vec<(DateTime<Utc>, Option<f64>)> = observations
            .iter()
            .filter_map(|o| o.parsed_timestamp().map(|t| (t, o.temperature)))
            .collect();

        let skipped = observations.len() - dated.len();
        if skipped > 0 {
            tracing::warn!(skipped, "Skipping records without a parseable timestamp");
        }

        if dated.len() < MIN_TIMESTAMPS {
            return Err(OceanError::insufficient("temporal analysis", MIN_TIMESTAMPS, dated.len()));
        }

        let mut series: Vec<(DateTime<Utc>, f64)> =
            dated.iter().filter_map(|(t, temp)| temp.map(|v| (*t, v))).collect();
        series.sort_by_key(|(t, _)| *t);

        let temps: Vec<f64> = observations.iter().filter_map(|o| o.temperature).collect();

        Ok(TemporalReport {
            temporal_statistics: statistics(&dated),
            seasonal_patterns: seasonal(&series).into(),
            trend_analysis: trend(&series).into(),
            anomaly_detection: self.anomalies(&series).into(),
            variability_analysis: variability(&temps).into(),
        })
    }

    fn anomalies(&self, series: &[(DateTime<Utc>, f64)]) -> Result<AnomalyReport<TemporalAnomaly>> {
        if series.len() < MIN_ANOMALY_POINTS {
            return Err(OceanError::insufficient(
                "temporal anomaly detection",
                MIN_ANOMALY_POINTS,
                series.len(),
            ));
        }

        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        let anomalies = z_scores(&values)
            .unwrap_or_default()
            .into_iter()
            .zip(series)
            .filter(|(z, _)| z.abs() >= self.z_threshold)
            .map(|(z, (t, value))| TemporalAnomaly {
                date: format_timestamp(t),
                value: *value,
                z_score: z,
                anomaly_type: "temporal_outlier",
            })
            .collect();

        Ok(AnomalyReport::new(anomalies, values.len()))
    }
}

/// Analyze temporal patterns with the default anomaly threshold
pub fn analyze_temporal(observations: &[Observation]) -> Result<TemporalReport> {
    TemporalAnalyzer::default().analyze(observations)
}

fn statistics(dated: &[(DateTime<Utc>, Option<f64>)]) -> TemporalStatistics {
    let start = dated.iter().map(|(t, _)| *t).min().unwrap_or_default();
    let end = dated.iter().map(|(t, _)| *t).max().unwrap_or_default();
    let time_span_days = (end - start).num_days();

    TemporalStatistics {
        start_date: format_timestamp(&start),
        end_date: format_timestamp(&end),
        time_span_days,
        data_points: dated.len(),
        temporal_resolution: time_span_days as f64 / dated.len() as f64,
    }
}

fn seasonal(series: &[(DateTime<Utc>, f64)]) -> Result<SeasonalPatterns> {
    if series.is_empty() {
        return Err(OceanError::insufficient("seasonal patterns", 1, 0));
    }

    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut by_season: BTreeMap<Season, Vec<f64>> = BTreeMap::new();
    for (t, value) in series {
        by_month.entry(t.month()).or_default().push(*value);
        by_season.entry(Season::from_month(t.month())).or_default().push(*value);
    }

    let monthly_statistics: BTreeMap<u32, PeriodStatistics> = by_month
        .iter()
        .filter_map(|(month, values)| PeriodStatistics::from_values(values).map(|s| (*month, s)))
        .collect();
    let seasonal_statistics = by_season
        .iter()
        .filter_map(|(season, values)| PeriodStatistics::from_values(values).map(|s| (*season, s)))
        .collect();

    let peak_month = monthly_statistics
        .iter()
        .max_by(|a, b| a.1.mean_temperature.total_cmp(&b.1.mean_temperature))
        .map(|(month, _)| *month);

    Ok(SeasonalPatterns {
        seasonal_cycle_detected: monthly_statistics.len() >= SEASONAL_CYCLE_MONTHS,
        monthly_statistics,
        seasonal_statistics,
        peak_month,
    })
}

fn trend(series: &[(DateTime<Utc>, f64)]) -> Result<TrendAnalysis> {
    if series.len() < MIN_TREND_POINTS {
        return Err(OceanError::insufficient("trend analysis", MIN_TREND_POINTS, series.len()));
    }

    let times: Vec<f64> = series.iter().map(|(t, _)| t.timestamp_millis() as f64 / 1000.0).collect();
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let fit = linear_regression(&times, &values)?;

    let trend_per_year = fit.slope * SECONDS_PER_YEAR;
    Ok(TrendAnalysis {
        slope: fit.slope,
        intercept: fit.intercept,
        trend_per_year,
        r_squared: fit.r_squared,
        p_value: fit.p_value,
        std_err: fit.std_err,
        significant_trend: fit.p_value < SIGNIFICANCE_LEVEL,
        trend_direction: if trend_per_year > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        },
    })
}

fn variability(temps: &[f64]) -> Result<Variability> {
    if temps.len() < MIN_VARIABILITY_POINTS {
        return Err(OceanError::insufficient(
            "variability analysis",
            MIN_VARIABILITY_POINTS,
            temps.len(),
        ));
    }

    let sorted = sorted(temps);
    let not_empty = || OceanError::insufficient("variability analysis", 1, 0);
    let mean = mean(temps).ok_or_else(not_empty)?;
    let variance = population_variance(temps).ok_or_else(not_empty)?;
    let std = variance.sqrt();
    let q1 = percentile(&sorted, 25.0).ok_or_else(not_empty)?;
    let q3 = percentile(&sorted, 75.0).ok_or_else(not_empty)?;

    Ok(Variability {
        coefficient_of_variation: (mean != 0.0).then(|| std / mean),
        range: sorted[sorted.len() - 1] - sorted[0],
        interquartile_range: q3 - q1,
        variance,
        standard_deviation: std,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oceanlens_core::error::ErrorKind;

    fn dated(date: &str, temp: f64) -> Observation {
        Observation::at(0.0, 0.0).with_timestamp(date).with_temperature(temp)
    }

    #[test]
    fn test_requires_three_timestamps() {
        let data = vec![
            dated("2023-01-01", 10.0),
            dated("not a date", 11.0),
            Observation::at(0.0, 0.0).with_temperature(12.0),
            dated("2023-01-03", 13.0),
        ];
        let err = analyze_temporal(&data).unwrap_err();
        assert!(matches!(err, OceanError::InsufficientData { required: 3, found: 2, .. }));
    }

    #[test]
    fn test_linear_trend() {
        let data = vec![
            dated("2023-01-01", 10.0),
            dated("2023-01-02T00:00:00Z", 12.0),
            dated("2023-01-03T00:00:00", 14.0),
            dated("2023-01-04", 16.0),
        ];
        let report = analyze_temporal(&data).unwrap();
        let trend = report.trend_analysis.ready().unwrap();
        assert!(trend.slope > 0.0);
        assert!((trend.r_squared - 1.0).abs() < 1e-9);
        assert!(trend.significant_trend);
        assert_eq!(trend.trend_direction, TrendDirection::Increasing);
        assert!((trend.trend_per_year - 2.0 * 365.25).abs() < 1e-6);
    }

    #[test]
    fn test_statistics() {
        let data = vec![
            dated("2023-01-11", 10.0),
            dated("2023-01-01", 12.0),
            dated("2023-01-31", 14.0),
        ];
        let stats = analyze_temporal(&data).unwrap().temporal_statistics;
        assert_eq!(stats.start_date, "2023-01-01T00:00:00Z");
        assert_eq!(stats.end_date, "2023-01-31T00:00:00Z");
        assert_eq!(stats.time_span_days, 30);
        assert_eq!(stats.temporal_resolution, 10.0);
    }

    #[test]
    fn test_seasonal_cycle() {
        let data: Vec<Observation> = (1..=8)
            .map(|month| dated(&format!("2022-{:02}-15", month), 5.0 + month as f64))
            .collect();
        let report = analyze_temporal(&data).unwrap();
        let seasonal = report.seasonal_patterns.ready().unwrap();
        assert!(seasonal.seasonal_cycle_detected);
        assert_eq!(seasonal.peak_month, Some(8));
        assert_eq!(seasonal.monthly_statistics.len(), 8);
        assert_eq!(seasonal.seasonal_statistics[&Season::Winter].count, 2);
        assert_eq!(seasonal.seasonal_statistics[&Season::Summer].count, 3);
    }

    #[test]
    fn test_no_cycle_with_few_months() {
        let data: Vec<Observation> = (1..=6)
            .map(|day| dated(&format!("2022-03-{:02}", day), 10.0))
            .collect();
        let report = analyze_temporal(&data).unwrap();
        assert!(!report.seasonal_patterns.ready().unwrap().seasonal_cycle_detected);
    }

    #[test]
    fn test_anomalies_over_time_series() {
        let temps = [20.0, 20.0, 100.0, 20.0, 20.0];
        let data: Vec<Observation> = temps
            .iter()
            .enumerate()
            .map(|(i, &t)| dated(&format!("2023-02-{:02}", i + 1), t))
            .collect();
        let report = analyze_temporal(&data).unwrap();
        let anomalies = report.anomaly_detection.ready().unwrap();
        assert_eq!(anomalies.anomaly_count, 1);
        assert_eq!(anomalies.anomalies[0].date, "2023-02-03T00:00:00Z");
        assert_eq!(anomalies.anomalies[0].value, 100.0);
    }

    #[test]
    fn test_variability() {
        let data = vec![
            dated("2023-01-01", 1.0),
            dated("2023-01-02", 2.0),
            dated("2023-01-03", 3.0),
            dated("2023-01-04", 4.0),
        ];
        let report = analyze_temporal(&data).unwrap();
        let variability = report.variability_analysis.ready().unwrap();
        assert_eq!(variability.range, 3.0);
        assert!((variability.interquartile_range - 1.5).abs() < 1e-12);
        assert!((variability.variance - 1.25).abs() < 1e-12);
        assert!((variability.coefficient_of_variation.unwrap() - 1.25f64.sqrt() / 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_mean_has_no_coefficient_of_variation() {
        let data = vec![
            dated("2023-01-01", -1.0),
            dated("2023-01-02", 0.0),
            dated("2023-01-03", 1.0),
        ];
        let report = analyze_temporal(&data).unwrap();
        assert_eq!(report.variability_analysis.ready().unwrap().coefficient_of_variation, None);
    }

    #[test]
    fn test_trend_without_temperatures() {
        let data: Vec<Observation> = (1..=3)
            .map(|d| Observation::at(0.0, 0.0).with_timestamp(format!("2023-01-0{}", d)))
            .collect();
        let report = analyze_temporal(&data).unwrap();
        assert_eq!(report.trend_analysis.error().unwrap().kind, ErrorKind::InsufficientData);
        assert_eq!(report.seasonal_patterns.error().unwrap().kind, ErrorKind::InsufficientData);
    }
}

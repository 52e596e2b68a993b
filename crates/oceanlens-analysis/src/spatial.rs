//! Spatial analysis of an observation set.
//!
//! Every part of [`SpatialReport`] is computed independently; a part that
//! cannot be computed carries its own error instead of failing the report.

use oceanlens_core::error::{OceanError, Result};
use oceanlens_core::models::{Observation, Parameter, Section};
use oceanlens_geo::planar::{planar_distance, CoordinateExtent};
use serde::Serialize;

use crate::cluster::{cluster_count, dbscan, standardize, DBSCAN_EPS, DBSCAN_MIN_POINTS, NOISE};
use crate::stats::{describe, pearson, z_scores, Correlation};
use crate::{AnomalyReport, DEFAULT_Z_THRESHOLD};

const MIN_OBSERVATIONS: usize = 3;
const MIN_CLUSTER_POINTS: usize = 3;
const MIN_ANOMALY_POINTS: usize = 5;
const MIN_GRADIENT_OBSERVATIONS: usize = 4;
const MIN_GRADIENT_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub span: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialStatistics {
    pub lat_range: AxisRange,
    pub lon_range: AxisRange,
    /// Diagonal of the covered bounds in degrees
    pub spatial_extent: f64,
    /// Observations per square degree
    pub data_density: Section<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMember {
    pub lat: f64,
    pub lon: f64,
    /// Index into the analyzed observations
    pub data_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub label: i32,
    pub members: Vec<ClusterMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub n_clusters: usize,
    pub noise_points: usize,
    pub clusters: Vec<Cluster>,
    pub noise: Vec<ClusterMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialCorrelations {
    pub temperature_salinity: Section<Correlation>,
    pub latitude_temperature: Section<Correlation>,
    pub longitude_temperature: Section<Correlation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialAnomaly {
    pub index: usize,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub temperature: f64,
    pub z_score: f64,
    pub anomaly_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientStatistics {
    pub mean_gradient: f64,
    pub std_gradient: f64,
    pub min_gradient: f64,
    pub max_gradient: f64,
    pub pair_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientReport {
    pub temperature_gradients: Section<GradientStatistics>,
    pub salinity_gradients: Section<GradientStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialReport {
    pub spatial_statistics: Section<SpatialStatistics>,
    pub regional_clusters: Section<ClusterReport>,
    pub spatial_correlations: SpatialCorrelations,
    pub anomaly_detection: Section<AnomalyReport<SpatialAnomaly>>,
    pub gradient_analysis: Section<GradientReport>,
}

/// Spatial analyzer with a configurable anomaly threshold
#[derive(Debug, Clone, Copy)]
pub struct SpatialAnalyzer {
    z_threshold: f64,
}

impl Default for SpatialAnalyzer {
    fn default() -> Self {
        Self { z_threshold: DEFAULT_Z_THRESHOLD }
    }
}

impl SpatialAnalyzer {
    pub fn new(z_threshold: f64) -> Self {
        Self { z_threshold }
    }

    /// Analyze spatial patterns; fails only when fewer than three observations are given
    pub fn analyze(&self, observations: &[Observation]) -> Result<SpatialReport> {
        if observations.len() < MIN_OBSERVATIONS {
            return Err(OceanError::insufficient(
                "spatial analysis",
                MIN_OBSERVATIONS,
                observations.len(),
            ));
        }

        let located: Vec<(usize, (f64, f64))> = observations
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.coordinates().map(|c| (i, c)))
            .collect();

        Ok(SpatialReport {
            spatial_statistics: statistics(&located).into(),
            regional_clusters: clusters(&located).into(),
            spatial_correlations: correlations(observations),
            anomaly_detection: self.anomalies(observations).into(),
            gradient_analysis: gradients(observations).into(),
        })
    }

    fn anomalies(&self, observations: &[Observation]) -> Result<AnomalyReport<SpatialAnomaly>> {
        if observations.len() < MIN_ANOMALY_POINTS {
            return Err(OceanError::insufficient(
                "spatial anomaly detection",
                MIN_ANOMALY_POINTS,
                observations.len(),
            ));
        }

        let (indices, temps): (Vec<usize>, Vec<f64>) = observations
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.temperature.map(|t| (i, t)))
            .unzip();
        if temps.len() < MIN_ANOMALY_POINTS {
            return Err(OceanError::insufficient(
                "spatial anomaly detection (temperature)",
                MIN_ANOMALY_POINTS,
                temps.len(),
            ));
        }

        let anomalies = z_scores(&temps)
            .unwrap_or_default()
            .into_iter()
            .zip(indices.iter().zip(&temps))
            .filter(|(z, _)| z.abs() >= self.z_threshold)
            .map(|(z, (&index, &temperature))| SpatialAnomaly {
                index,
                lat: observations[index].latitude,
                lon: observations[index].longitude,
                temperature,
                z_score: z,
                anomaly_type: "temperature_outlier",
            })
            .collect();

        Ok(AnomalyReport::new(anomalies, temps.len()))
    }
}

/// Analyze spatial patterns with the default anomaly threshold
pub fn analyze_spatial(observations: &[Observation]) -> Result<SpatialReport> {
    SpatialAnalyzer::default().analyze(observations)
}

fn statistics(located: &[(usize, (f64, f64))]) -> Result<SpatialStatistics> {
    let extent = CoordinateExtent::from_points(located.iter().map(|(_, c)| *c))
        .ok_or_else(|| OceanError::insufficient("spatial statistics", 1, 0))?;

    let data_density = match extent.area() {
        Some(area) => Section::Ready(located.len() as f64 / area),
        None => Section::failed(OceanError::CoverageUndefined {
            analysis: "data density".to_string(),
            reason: format!(
                "latitude span {} or longitude span {} is zero",
                extent.lat_span(),
                extent.lon_span()
            ),
        }),
    };

    Ok(SpatialStatistics {
        lat_range: AxisRange { min: extent.lat_min, max: extent.lat_max, span: extent.lat_span() },
        lon_range: AxisRange { min: extent.lon_min, max: extent.lon_max, span: extent.lon_span() },
        spatial_extent: extent.diagonal(),
        data_density,
    })
}

fn clusters(located: &[(usize, (f64, f64))]) -> Result<ClusterReport> {
    if located.len() < MIN_CLUSTER_POINTS {
        return Err(OceanError::insufficient("clustering", MIN_CLUSTER_POINTS, located.len()));
    }

    let coords: Vec<(f64, f64)> = located.iter().map(|(_, c)| *c).collect();
    let labels = dbscan(&standardize(&coords), DBSCAN_EPS, DBSCAN_MIN_POINTS);
    let n_clusters = cluster_count(&labels);

    let mut clusters: Vec<Cluster> =
        (0..n_clusters).map(|label| Cluster { label: label as i32, members: Vec::new() }).collect();
    let mut noise = Vec::new();

    for (&label, &(data_index, (lat, lon))) in labels.iter().zip(located) {
        let member = ClusterMember { lat, lon, data_index };
        if label == NOISE {
            noise.push(member);
        } else {
            clusters[label as usize].members.push(member);
        }
    }

    Ok(ClusterReport { n_clusters, noise_points: noise.len(), clusters, noise })
}

fn correlations(observations: &[Observation]) -> SpatialCorrelations {
    let (temps, salinities): (Vec<f64>, Vec<f64>) = observations
        .iter()
        .filter_map(|o| o.temperature.zip(o.salinity))
        .unzip();

    let located_temps: Vec<(f64, f64, f64)> = observations
        .iter()
        .filter_map(|o| o.coordinates().zip(o.temperature).map(|((lat, lon), t)| (lat, lon, t)))
        .collect();
    let lats: Vec<f64> = located_temps.iter().map(|p| p.0).collect();
    let lons: Vec<f64> = located_temps.iter().map(|p| p.1).collect();
    let position_temps: Vec<f64> = located_temps.iter().map(|p| p.2).collect();

    SpatialCorrelations {
        temperature_salinity: pearson(&temps, &salinities).into(),
        latitude_temperature: pearson(&lats, &position_temps).into(),
        longitude_temperature: pearson(&lons, &position_temps).into(),
    }
}

fn gradients(observations: &[Observation]) -> Result<GradientReport> {
    if observations.len() < MIN_GRADIENT_OBSERVATIONS {
        return Err(OceanError::insufficient(
            "gradient analysis",
            MIN_GRADIENT_OBSERVATIONS,
            observations.len(),
        ));
    }

    Ok(GradientReport {
        temperature_gradients: parameter_gradients(observations, Parameter::Temperature).into(),
        salinity_gradients: parameter_gradients(observations, Parameter::Salinity).into(),
    })
}

fn parameter_gradients(
    observations: &[Observation],
    parameter: Parameter,
) -> Result<GradientStatistics> {
    let valid: Vec<((f64, f64), f64)> = observations
        .iter()
        .filter_map(|o| o.coordinates().zip(o.parameter(parameter)))
        .collect();

    if valid.len() < MIN_GRADIENT_POINTS {
        return Err(OceanError::insufficient(
            format!("{} gradients", parameter.as_str()),
            MIN_GRADIENT_POINTS,
            valid.len(),
        ));
    }

    let mut gradients = Vec::with_capacity(valid.len() * (valid.len() - 1));
    for (i, (p1, v1)) in valid.iter().enumerate() {
        for (j, (p2, v2)) in valid.iter().enumerate() {
            if i == j {
                continue;
            }
            let distance = planar_distance(*p1, *p2);
            if distance > 0.0 {
                gradients.push((v2 - v1) / distance);
            }
        }
    }

    let summary = describe(&gradients).ok_or_else(|| OceanError::CoverageUndefined {
        analysis: format!("{} gradients", parameter.as_str()),
        reason: "all observations share one position".to_string(),
    })?;

    Ok(GradientStatistics {
        mean_gradient: summary.mean,
        std_gradient: summary.std,
        min_gradient: summary.min,
        max_gradient: summary.max,
        pair_count: summary.count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oceanlens_core::error::ErrorKind;

    fn obs(lat: f64, lon: f64, temp: f64) -> Observation {
        Observation::at(lat, lon).with_temperature(temp)
    }

    #[test]
    fn test_too_few_observations() {
        let err = analyze_spatial(&[obs(0.0, 0.0, 1.0), obs(1.0, 1.0, 2.0)]).unwrap_err();
        assert!(matches!(err, OceanError::InsufficientData { required: 3, found: 2, .. }));
    }

    #[test]
    fn test_statistics_and_density() {
        let data = vec![obs(10.0, -20.0, 5.0), obs(13.0, -16.0, 6.0), obs(11.0, -18.0, 7.0)];
        let report = analyze_spatial(&data).unwrap();
        let stats = report.spatial_statistics.ready().unwrap();
        assert_eq!(stats.lat_range.span, 3.0);
        assert_eq!(stats.lon_range.span, 4.0);
        assert_eq!(stats.spatial_extent, 5.0);
        assert_eq!(stats.data_density.ready(), Some(&0.25));
    }

    #[test]
    fn test_collinear_density_is_undefined() {
        let data = vec![obs(10.0, 0.0, 5.0), obs(11.0, 0.0, 6.0), obs(12.0, 0.0, 7.0)];
        let report = analyze_spatial(&data).unwrap();
        let stats = report.spatial_statistics.ready().unwrap();
        assert_eq!(stats.data_density.error().unwrap().kind, ErrorKind::CoverageUndefined);
        // Sibling sections are unaffected
        assert!(report.regional_clusters.is_ready());
    }

    #[test]
    fn test_anomaly_flags_only_outlier() {
        let data: Vec<Observation> = [20.0, 20.0, 20.0, 20.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, &t)| obs(i as f64, i as f64, t))
            .collect();
        let report = analyze_spatial(&data).unwrap();
        let anomalies = report.anomaly_detection.ready().unwrap();
        assert_eq!(anomalies.anomaly_count, 1);
        assert_eq!(anomalies.anomalies[0].index, 4);
        assert_eq!(anomalies.anomalies[0].temperature, 100.0);
        assert_eq!(anomalies.anomaly_rate, 0.2);
    }

    #[test]
    fn test_anomalies_need_five_points() {
        let data = vec![obs(0.0, 0.0, 1.0), obs(1.0, 1.0, 2.0), obs(2.0, 2.0, 3.0)];
        let report = analyze_spatial(&data).unwrap();
        assert_eq!(report.anomaly_detection.error().unwrap().kind, ErrorKind::InsufficientData);
        assert_eq!(report.gradient_analysis.error().unwrap().kind, ErrorKind::InsufficientData);
    }

    #[test]
    fn test_two_groups_form_clusters() {
        let mut data = Vec::new();
        for i in 0..4 {
            let d = i as f64 * 0.1;
            data.push(obs(d, d, 10.0));
            data.push(obs(10.0 + d, 10.0 - d, 12.0));
        }
        let report = analyze_spatial(&data).unwrap();
        let clusters = report.regional_clusters.ready().unwrap();
        assert!(clusters.n_clusters >= 2);
        assert_eq!(clusters.noise_points, 0);
    }

    #[test]
    fn test_correlations() {
        let data: Vec<Observation> = (0..5)
            .map(|i| {
                let i = i as f64;
                obs(i, 0.0, 10.0 + i).with_salinity(30.0 + 2.0 * i)
            })
            .collect();
        let report = analyze_spatial(&data).unwrap();
        let ts = report.spatial_correlations.temperature_salinity.ready().unwrap();
        assert!((ts.correlation - 1.0).abs() < 1e-9);
        assert!(ts.significant);
        assert!(report.spatial_correlations.latitude_temperature.is_ready());
        // Longitude is constant
        assert_eq!(
            report.spatial_correlations.longitude_temperature.error().unwrap().kind,
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_gradients() {
        let data = vec![
            obs(0.0, 0.0, 10.0),
            obs(1.0, 0.0, 11.0),
            obs(0.0, 1.0, 12.0),
            obs(1.0, 1.0, 13.0),
        ];
        let report = analyze_spatial(&data).unwrap();
        let gradients = report.gradient_analysis.ready().unwrap();
        let temperature = gradients.temperature_gradients.ready().unwrap();
        assert_eq!(temperature.pair_count, 12);
        // Ordered pairs cancel out
        assert!(temperature.mean_gradient.abs() < 1e-12);
        assert!((temperature.max_gradient - 3.0 / 2f64.sqrt()).abs() < 1e-12);
        assert!(gradients.salinity_gradients.error().is_some());
    }
}

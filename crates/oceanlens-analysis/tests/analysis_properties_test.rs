//! Integration tests for the analyzers and the quality engine
//!
//! These tests exercise the public API end to end over realistic observation sets.

use oceanlens_analysis::temporal::TrendDirection;
use oceanlens_analysis::{
    analyze_spatial, analyze_temporal, assess_quality, enhance_quality, SpatialAnalyzer,
};
use oceanlens_core::error::ErrorKind;
use oceanlens_core::models::Observation;
use proptest::prelude::*;

/// 30 complete, in-range records spread over 40 degrees of latitude and 29 days
fn clean_profiles() -> Vec<Observation> {
    (0..30)
        .map(|i| {
            Observation::at(-20.0 + i as f64 * (40.0 / 29.0), -30.0 + (i % 3) as f64)
                .with_id(format!("profile-{}", i))
                .with_temperature(15.0 + (i % 5) as f64 * 0.5)
                .with_salinity(35.0 + (i % 4) as f64 * 0.1)
                .with_timestamp(format!("2023-03-{:02}", i + 1))
        })
        .collect()
}

#[test]
fn test_clean_set_scores_high() {
    let report = assess_quality(&clean_profiles());
    assert!(
        report.overall_quality_score >= 95.0,
        "score was {}",
        report.overall_quality_score
    );
    assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);
}

#[test]
fn test_fill_value_temperatures_score_low() {
    let data: Vec<Observation> = (0..10)
        .map(|i| {
            Observation::at(40.0 + i as f64 * 0.2, -60.0 + i as f64 * 0.2)
                .with_temperature(-999.0)
                .with_salinity(35.0)
                .with_timestamp(format!("2023-05-{:02}", i + 1))
        })
        .collect();

    let report = assess_quality(&data);
    let dims = report.dimensions.as_ref().unwrap();
    assert_eq!(dims.consistency.violations["temperature"], 10);
    assert!(report.issues.iter().any(|issue| issue.contains("temperature values outside")));
    assert!(report.overall_quality_score < 60.0, "score was {}", report.overall_quality_score);
}

#[test]
fn test_fill_value_temperatures_score_low_over_wide_extent() {
    // Daily records spanning 81 by 45 degrees: coverage scores are perfect
    let data: Vec<Observation> = (0..10)
        .map(|i| {
            Observation::at(-40.0 + i as f64 * 9.0, -60.0 + i as f64 * 5.0)
                .with_temperature(-999.0)
                .with_salinity(35.0)
                .with_timestamp(format!("2023-05-{:02}", i + 1))
        })
        .collect();

    let report = assess_quality(&data);
    let dims = report.dimensions.as_ref().unwrap();
    assert_eq!(dims.temporal_coverage.score, 100.0);
    assert_eq!(dims.spatial_coverage.score, 100.0);
    assert_eq!(dims.accuracy.ready().unwrap().score, 100.0);
    assert_eq!(dims.consistency.valid_record_rate, 0.0);
    assert!(report.overall_quality_score < 60.0, "score was {}", report.overall_quality_score);
    assert_eq!(report.overall_quality_score, 0.0);
}

#[test]
fn test_enhancement_is_idempotent_on_clean_set() {
    let data = clean_profiles();
    let once = enhance_quality(&data);
    assert_eq!(once.enhanced_data, data);
    assert!(once.enhancements_applied.is_empty());

    let twice = enhance_quality(&once.enhanced_data);
    assert_eq!(twice.enhanced_data, once.enhanced_data);
    assert!(twice.enhancements_applied.is_empty());
}

#[test]
fn test_single_spatial_outlier() {
    let data: Vec<Observation> = [20.0, 20.0, 20.0, 20.0, 100.0]
        .iter()
        .enumerate()
        .map(|(i, &t)| Observation::at(i as f64, -(i as f64)).with_temperature(t))
        .collect();

    let report = analyze_spatial(&data).unwrap();
    let anomalies = report.anomaly_detection.ready().unwrap();
    let flagged: Vec<usize> = anomalies.anomalies.iter().map(|a| a.index).collect();
    assert_eq!(flagged, vec![4]);
}

#[test]
fn test_colocated_profiles_leave_coverage_undefined() {
    let data: Vec<Observation> = (0..5)
        .map(|i| {
            Observation::at(12.5, -40.0)
                .with_temperature(18.0 + i as f64)
                .with_salinity(35.0 + i as f64 * 0.1)
                .with_timestamp(format!("2023-07-{:02}", i + 1))
        })
        .collect();

    let report = SpatialAnalyzer::default().analyze(&data).unwrap();
    let stats = report.spatial_statistics.ready().unwrap();
    assert_eq!(stats.spatial_extent, 0.0);
    assert_eq!(stats.data_density.error().unwrap().kind, ErrorKind::CoverageUndefined);

    let gradients = report.gradient_analysis.ready().unwrap();
    assert_eq!(
        gradients.temperature_gradients.error().unwrap().kind,
        ErrorKind::CoverageUndefined
    );
    assert_eq!(gradients.salinity_gradients.error().unwrap().kind, ErrorKind::CoverageUndefined);

    let quality = assess_quality(&data);
    assert_eq!(quality.dimensions.unwrap().spatial_coverage.data_density, None);
}

#[test]
fn test_collinear_profiles_have_no_density_but_keep_gradients() {
    // One line of latitude: zero latitude span, distinct positions
    let data: Vec<Observation> = (0..5)
        .map(|i| Observation::at(12.5, -40.0 + i as f64).with_temperature(18.0 + i as f64))
        .collect();

    let report = SpatialAnalyzer::default().analyze(&data).unwrap();
    let stats = report.spatial_statistics.ready().unwrap();
    assert_eq!(stats.lat_range.span, 0.0);
    assert_eq!(stats.data_density.error().unwrap().kind, ErrorKind::CoverageUndefined);

    let gradients = report.gradient_analysis.ready().unwrap();
    let temperature = gradients.temperature_gradients.ready().unwrap();
    assert_eq!(temperature.pair_count, 20);

    let quality = assess_quality(&data);
    assert_eq!(quality.dimensions.unwrap().spatial_coverage.data_density, None);
}

#[test]
fn test_stricter_threshold_flags_nothing() {
    let data: Vec<Observation> = [20.0, 20.0, 20.0, 20.0, 100.0]
        .iter()
        .map(|&t| Observation::at(0.0, 0.0).with_temperature(t))
        .collect();

    let report = SpatialAnalyzer::new(2.5).analyze(&data).unwrap();
    assert_eq!(report.anomaly_detection.ready().unwrap().anomaly_count, 0);
}

#[test]
fn test_linear_series_trend() {
    let data: Vec<Observation> = [(1, 10.0), (2, 12.0), (3, 14.0), (4, 16.0)]
        .iter()
        .map(|&(day, temp)| {
            Observation::at(0.0, 0.0)
                .with_timestamp(format!("2024-06-{:02}T00:00:00Z", day))
                .with_temperature(temp)
        })
        .collect();

    let trend = analyze_temporal(&data).unwrap().trend_analysis;
    let trend = trend.ready().unwrap();
    assert!(trend.slope > 0.0);
    assert!((trend.r_squared - 1.0).abs() < 1e-9);
    assert!(trend.significant_trend);
    assert_eq!(trend.trend_direction, TrendDirection::Increasing);
}

#[test]
fn test_report_serializes_section_errors_in_band() {
    let data = vec![
        Observation::at(0.0, 0.0).with_temperature(1.0),
        Observation::at(1.0, 0.0).with_temperature(2.0),
        Observation::at(2.0, 0.0).with_temperature(3.0),
    ];
    let value = serde_json::to_value(analyze_spatial(&data).unwrap()).unwrap();
    assert_eq!(value["anomaly_detection"]["error"]["kind"], "insufficient_data");
    assert_eq!(value["spatial_statistics"]["data_density"]["error"]["kind"], "coverage_undefined");
    assert_eq!(value["spatial_statistics"]["lat_range"]["span"], 2.0);
}

proptest! {
    #[test]
    fn prop_two_separated_groups_cluster(
        ax in -60.0f64..0.0,
        ay in -150.0f64..0.0,
        gap in 5.0f64..40.0,
    ) {
        let mut data = Vec::new();
        for i in 0..4 {
            let d = i as f64 * 0.05;
            data.push(Observation::at(ax + d, ay + d));
            data.push(Observation::at(ax + gap + d, ay + gap - d));
        }

        let report = analyze_spatial(&data).unwrap();
        let clusters = report.regional_clusters.ready().unwrap();
        prop_assert!(clusters.n_clusters >= 2);
    }

    #[test]
    fn prop_quality_scores_stay_in_range(temps in prop::collection::vec(-1000.0f64..1000.0, 1..40)) {
        let data: Vec<Observation> = temps
            .iter()
            .enumerate()
            .map(|(i, &t)| Observation::at(i as f64 % 90.0, 0.0).with_temperature(t))
            .collect();

        let report = assess_quality(&data);
        prop_assert!(report.overall_quality_score >= 0.0);
        prop_assert!(report.overall_quality_score <= 100.0);
    }
}

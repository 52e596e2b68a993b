//! End-to-end tests of the query engine against the in-memory source

use chrono::{DateTime, TimeZone, Utc};
use oceanlens_core::config::{ConfigOverrides, EngineSettings, LayeredConfig};
use oceanlens_core::error::ErrorKind;
use oceanlens_core::models::{Observation, TimeWindow};
use oceanlens_query::{
    Clock, FetchStatus, ManualClock, OceanQueryEngine, PlanKind, QueryParameter,
};
use oceanlens_store::MemoryObservationSource;
use std::sync::Arc;
use std::time::Duration;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// 30 profiles inside the Gulf Stream box, dated within the trailing year
fn gulf_stream_profiles() -> Vec<Observation> {
    (0..30)
        .map(|i| {
            Observation::at(30.0 + (i % 10) as f64, -75.0 + (i % 6) as f64 * 2.0)
                .with_id(format!("gs-{}", i))
                .with_temperature(18.0 + (i % 7) as f64 * 0.5)
                .with_salinity(36.0 + (i % 3) as f64 * 0.1)
                .with_timestamp(format!("2024-{:02}-{:02}", 1 + i % 5, 1 + i % 28))
        })
        .collect()
}

fn engine(source: MemoryObservationSource, settings: EngineSettings) -> OceanQueryEngine<MemoryObservationSource> {
    OceanQueryEngine::new(source, settings).with_clock(Arc::new(ManualClock::new(now())))
}

#[tokio::test]
async fn test_named_region_runs_single_plan() {
    let source = MemoryObservationSource::new(gulf_stream_profiles());
    let engine = engine(source.clone(), EngineSettings::default());

    let report = engine.run_query("Temperature and salinity in the Gulf Stream").await.unwrap();

    assert_eq!(report.plan, PlanKind::Single);
    assert_eq!(report.region.name(), Some("Gulf Stream"));
    assert_eq!(report.fetches.len(), 1);
    assert_eq!(report.fetches[0].status, FetchStatus::Ok);
    assert_eq!(report.summary.data.total_profiles, 30);
    assert_eq!(report.summary.summary, "Analysis of 30 ocean profiles");
    assert_eq!(
        report.parameters,
        vec![QueryParameter::Temperature, QueryParameter::Salinity]
    );
    assert!(report.analysis.data_quality.is_ready());
    assert!(report.analysis.spatial_analysis.is_ready());
    assert!(report.analysis.temporal_analysis.is_ready());
    assert!(!report.cached);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn test_unnamed_region_fans_out_to_basins() {
    let source = MemoryObservationSource::new(gulf_stream_profiles());
    let engine = engine(source.clone(), EngineSettings::default());

    let report = engine.run_query("show me ocean temperature patterns").await.unwrap();

    assert_eq!(report.plan, PlanKind::Regional);
    assert_eq!(report.fetches.len(), 5);
    assert_eq!(source.fetch_count(), 5);

    let atlantic = &report.fetches[0];
    assert_eq!(atlantic.label, "North Atlantic");
    assert_eq!(atlantic.count, 30);
    assert!(report.fetches[1..].iter().all(|f| f.status == FetchStatus::Empty));
}

#[tokio::test]
async fn test_failed_basin_degrades_to_partial_data() {
    let source = MemoryObservationSource::new(gulf_stream_profiles());
    source.fail_region("North Pacific");
    let engine = engine(source, EngineSettings::default());

    let report = engine.run_query("global ocean temperature patterns").await.unwrap();

    let pacific = report.fetches.iter().find(|f| f.label == "North Pacific").unwrap();
    assert_eq!(pacific.status, FetchStatus::Failed);
    assert_eq!(pacific.error.as_ref().unwrap().kind, ErrorKind::UpstreamFetchFailure);
    assert_eq!(report.summary.data.total_profiles, 30);
    assert_eq!(report.summary.insights.len(), 1);
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let source = MemoryObservationSource::new(gulf_stream_profiles())
        .with_latency(Duration::from_millis(500));
    let settings = EngineSettings { fetch_timeout: Duration::from_millis(20), ..Default::default() };
    let engine = engine(source, settings);

    let report = engine.run_query("salinity in the gulf stream").await.unwrap();

    assert_eq!(report.fetches[0].status, FetchStatus::TimedOut);
    assert_eq!(report.summary.summary, "No data available for analysis");
    let spatial = report.analysis.spatial_analysis.error().unwrap();
    assert_eq!(spatial.kind, ErrorKind::InsufficientData);
}

#[tokio::test]
async fn test_repeated_query_is_served_from_cache() {
    let source = MemoryObservationSource::new(gulf_stream_profiles());
    let engine = engine(source.clone(), EngineSettings::default());

    let first = engine.run_query("salinity in the Gulf Stream").await.unwrap();
    let second = engine.run_query("  SALINITY in the   gulf stream ").await.unwrap();

    assert!(second.cached);
    assert_eq!(second.summary, first.summary);
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(engine.cached_reports(), 1);

    engine.clear_cache();
    engine.run_query("salinity in the Gulf Stream").await.unwrap();
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_expired_cache_entry_refetches() {
    let source = MemoryObservationSource::new(gulf_stream_profiles());
    let clock = Arc::new(ManualClock::new(now()));
    let settings = EngineSettings { cache_ttl: Some(Duration::from_secs(300)), ..Default::default() };
    let engine = OceanQueryEngine::new(source.clone(), settings).with_clock(clock.clone());

    engine.run_query("salinity in the Gulf Stream").await.unwrap();
    clock.advance(Duration::from_secs(301));
    let report = engine.run_query("salinity in the Gulf Stream").await.unwrap();

    assert!(!report.cached);
    assert_eq!(report.generated_at, clock.now());
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_short_query_is_rejected() {
    let engine = engine(MemoryObservationSource::default(), EngineSettings::default());
    let err = engine.run_query(" sst ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_enhancement_runs_before_analysis() {
    let mut config = LayeredConfig::with_defaults();
    config.apply_overrides(ConfigOverrides {
        enhance_before_analysis: Some(true),
        ..Default::default()
    });
    let engine = OceanQueryEngine::from_config(MemoryObservationSource::default(), &config).unwrap();

    let mut data = gulf_stream_profiles();
    data[0].temperature = Some(45.0);
    data[1].latitude = None;

    let sections = engine.analyze(data).await;
    let enhancement = sections.enhancement.unwrap();
    assert_eq!(enhancement.original_count, 30);
    assert!(!enhancement.enhancements_applied.is_empty());
    assert!(sections.data_quality.is_ready());
}

#[tokio::test]
async fn test_regional_metrics() {
    let data = vec![
        Observation::at(35.0, -40.0).with_temperature(20.0).with_timestamp("2024-03-01"),
        Observation::at(40.0, -30.0).with_temperature(22.0).with_timestamp("2024-03-02"),
        Observation::at(10.0, 70.0).with_temperature(28.0).with_timestamp("2024-03-03"),
    ];
    let engine = engine(MemoryObservationSource::new(data), EngineSettings::default());
    let window = TimeWindow::parse("2024-01-01", "2024-06-01").unwrap();

    let metrics = engine.regional_metrics(&window).await;

    assert_eq!(metrics.basins.len(), 5);
    assert_eq!(metrics.basins[0].basin, "North Atlantic");
    assert_eq!(metrics.basins[0].mean_temperature, Some(21.0));
    assert_eq!(metrics.basins[4].basin, "Indian Ocean");
    assert_eq!(metrics.basins[4].sample_count, 1);
    assert_eq!(metrics.mean_temperature, Some(24.5));
    assert_eq!(metrics.total_samples, 3);
}

#[tokio::test]
async fn test_regional_metrics_count_only_temperatures() {
    let data = vec![
        Observation::at(35.0, -40.0).with_temperature(20.0).with_timestamp("2024-03-01"),
        Observation::at(36.0, -41.0).with_salinity(35.2).with_timestamp("2024-03-02"),
        Observation::at(37.0, -42.0).with_salinity(35.4).with_timestamp("2024-03-03"),
    ];
    let engine = engine(MemoryObservationSource::new(data), EngineSettings::default());
    let window = TimeWindow::parse("2024-01-01", "2024-06-01").unwrap();

    let metrics = engine.regional_metrics(&window).await;

    let atlantic = &metrics.basins[0];
    assert_eq!(atlantic.status, FetchStatus::Ok);
    assert_eq!(atlantic.mean_temperature, Some(20.0));
    assert_eq!(atlantic.sample_count, 1);
    assert_eq!(metrics.total_samples, 1);
}

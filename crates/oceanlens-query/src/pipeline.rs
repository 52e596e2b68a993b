//! Query engine: text in, analyzed report out.
//!
//! Sub-queries of a plan are fetched concurrently, each under its own timeout.
//! A failed, empty or timed-out fetch is recorded and left out of the data;
//! it never fails the report.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use oceanlens_analysis::stats::mean;
use oceanlens_analysis::{
    assess_quality, enhance_quality, summarize, DataSummary, QualityReport, SpatialAnalyzer,
    SpatialReport, TemporalAnalyzer, TemporalReport,
};
use oceanlens_core::config::{EngineSettings, LayeredConfig};
use oceanlens_core::error::{ErrorKind, OceanError, Result};
use oceanlens_core::models::{AnalysisError, Observation, Region, Section, TimeWindow};
use oceanlens_core::ports::ObservationSource;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::{spawn_blocking, JoinError};

use crate::cache::{Clock, QueryCache, SystemClock};
use crate::decompose::{ocean_basins, Decomposer, PlanKind, QueryPlan, SubQuery};
use crate::extract::{
    default_time_window, extract_parameters, match_region, validate_input, QueryParameter,
    QueryType,
};
use crate::intent::{classify_intent, ComplexityTier, Intent, IntentResult};

const SPATIAL_INSIGHT: &str = "Spatial analysis recommended for this dataset";
const SPLIT_RECOMMENDATION: &str = "Consider breaking this into multiple focused analyses";
const PARTIAL_DATA_INSIGHT: &str = "Some sub-queries failed; results cover the remaining data only";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Empty,
    Failed,
    TimedOut,
}

/// What happened to one sub-query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome {
    pub label: String,
    pub status: FetchStatus,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
}

/// Enhancement actions applied before analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementSummary {
    pub enhancements_applied: Vec<String>,
    pub original_count: usize,
    pub enhanced_count: usize,
}

/// Independent analysis sections of one observation set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhancement: Option<EnhancementSummary>,
    pub data_quality: Section<QualityReport>,
    pub spatial_analysis: Section<SpatialReport>,
    pub temporal_analysis: Section<TemporalReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    pub summary: String,
    pub data: DataSummary,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OceanQueryReport {
    pub query: String,
    pub query_type: QueryType,
    pub intent: IntentResult,
    pub parameters: Vec<QueryParameter>,
    pub region: Region,
    pub window: TimeWindow,
    pub plan: PlanKind,
    pub fetches: Vec<FetchOutcome>,
    pub summary: QuerySummary,
    pub analysis: AnalysisSections,
    pub generated_at: DateTime<Utc>,
    /// Served from the result cache
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasinMetrics {
    pub basin: String,
    pub mean_temperature: Option<f64>,
    /// Temperature values behind the mean
    pub sample_count: usize,
    pub status: FetchStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalMetrics {
    pub window: TimeWindow,
    pub basins: Vec<BasinMetrics>,
    /// Mean of the basin means that could be computed
    pub mean_temperature: Option<f64>,
    pub total_samples: usize,
}

/// Query engine orchestrating decomposition, fetching and analysis
pub struct OceanQueryEngine<S: ObservationSource> {
    source: S,
    settings: EngineSettings,
    decomposer: Decomposer,
    cache: QueryCache<OceanQueryReport>,
    clock: Arc<dyn Clock>,
}

impl<S: ObservationSource> OceanQueryEngine<S> {
    pub fn new(source: S, settings: EngineSettings) -> Self {
        Self {
            decomposer: Decomposer::from_settings(&settings),
            cache: QueryCache::new(settings.cache_capacity, settings.cache_ttl),
            clock: Arc::new(SystemClock),
            source,
            settings,
        }
    }

    /// Build from layered configuration, validating it first
    pub fn from_config(source: S, config: &LayeredConfig) -> Result<Self> {
        Ok(Self::new(source, config.to_settings()?))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_reports(&self) -> usize {
        self.cache.len()
    }

    /// Answer a free-text query end to end
    pub async fn run_query(&self, query: &str) -> Result<OceanQueryReport> {
        let validation = validate_input(query);
        if !validation.valid {
            return Err(OceanError::InvalidInput {
                reason: format!("query '{}' is too short to analyze", query.trim()),
            });
        }

        let now = self.clock.now();
        if let Some(mut report) = self.cache.get(query, now) {
            tracing::debug!(query, "Serving cached report");
            report.cached = true;
            return Ok(report);
        }

        let intent = classify_intent(query);
        let region = match_region(query).map(Region::Bounds).unwrap_or_else(Region::global);
        let window = default_time_window(now);
        let plan = self.decomposer.decompose(&region, &window)?;

        tracing::info!(
            query,
            intent = ?intent.primary_intent,
            plan = ?plan.kind(),
            "Running ocean query"
        );

        let (observations, fetches) = self.fetch_plan(&plan).await;
        let data = summarize(&observations);
        let analysis = self.analyze(observations).await;
        let summary = build_summary(&intent, data, &fetches);

        let report = OceanQueryReport {
            query: query.to_string(),
            query_type: validation.query_type,
            parameters: extract_parameters(query),
            intent,
            region,
            window,
            plan: plan.kind(),
            fetches,
            summary,
            analysis,
            generated_at: now,
            cached: false,
        };

        tracing::info!(
            query,
            profiles = report.summary.data.total_profiles,
            "Ocean query complete"
        );
        self.cache.insert(query, report.clone(), now);
        Ok(report)
    }

    /// Run the quality, spatial and temporal analyses over a set of observations
    pub async fn analyze(&self, observations: Vec<Observation>) -> AnalysisSections {
        let (observations, enhancement) = if self.settings.enhance_before_analysis {
            let result = enhance_quality(&observations);
            let summary = EnhancementSummary {
                enhancements_applied: result.enhancements_applied,
                original_count: result.original_count,
                enhanced_count: result.enhanced_count,
            };
            (result.enhanced_data, Some(summary))
        } else {
            (observations, None)
        };

        let data = Arc::new(observations);
        let threshold = self.settings.anomaly_z_threshold;

        let quality = spawn_blocking({
            let data = Arc::clone(&data);
            move || assess_quality(&data)
        });
        let spatial = spawn_blocking({
            let data = Arc::clone(&data);
            move || SpatialAnalyzer::new(threshold).analyze(&data)
        });
        let temporal = spawn_blocking({
            let data = Arc::clone(&data);
            move || TemporalAnalyzer::new(threshold).analyze(&data)
        });

        let (quality, spatial, temporal) = tokio::join!(quality, spatial, temporal);

        AnalysisSections {
            enhancement,
            data_quality: joined("data quality", quality.map(Ok)),
            spatial_analysis: joined("spatial analysis", spatial),
            temporal_analysis: joined("temporal analysis", temporal),
        }
    }

    /// Mean temperature and sample count per ocean basin over a window
    pub async fn regional_metrics(&self, window: &TimeWindow) -> RegionalMetrics {
        let plan = QueryPlan::Regional { window: *window, basins: ocean_basins() };
        let sub_queries = plan.sub_queries();
        let results = join_all(sub_queries.iter().map(|sq| self.fetch_one(sq))).await;

        let basins: Vec<BasinMetrics> = results
            .into_iter()
            .map(|(outcome, observations)| {
                let temps: Vec<f64> = observations.iter().filter_map(|o| o.temperature).collect();
                BasinMetrics {
                    basin: outcome.label,
                    mean_temperature: mean(&temps),
                    sample_count: temps.len(),
                    status: outcome.status,
                }
            })
            .collect();

        let means: Vec<f64> = basins.iter().filter_map(|b| b.mean_temperature).collect();
        RegionalMetrics {
            window: *window,
            mean_temperature: mean(&means),
            total_samples: basins.iter().map(|b| b.sample_count).sum(),
            basins,
        }
    }

    async fn fetch_plan(&self, plan: &QueryPlan) -> (Vec<Observation>, Vec<FetchOutcome>) {
        let sub_queries = plan.sub_queries();
        let results = join_all(sub_queries.iter().map(|sq| self.fetch_one(sq))).await;

        let mut observations = Vec::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for (outcome, batch) in results {
            observations.extend(batch);
            outcomes.push(outcome);
        }
        (observations, outcomes)
    }

    /// Fetch one sub-query; failures and timeouts degrade to an empty batch
    async fn fetch_one(&self, sub_query: &SubQuery) -> (FetchOutcome, Vec<Observation>) {
        let label = sub_query.label();
        let fetch = self.source.fetch(&sub_query.region, &sub_query.window);

        match tokio::time::timeout(self.settings.fetch_timeout, fetch).await {
            Ok(Ok(observations)) => {
                let status = if observations.is_empty() {
                    tracing::warn!(sub_query = %label, source = self.source.name(), "Sub-query returned no data");
                    FetchStatus::Empty
                } else {
                    FetchStatus::Ok
                };
                let outcome =
                    FetchOutcome { label, status, count: observations.len(), error: None };
                (outcome, observations)
            }
            Ok(Err(err)) => {
                tracing::warn!(sub_query = %label, error = %err, "Sub-query failed");
                let outcome = FetchOutcome {
                    label,
                    status: FetchStatus::Failed,
                    count: 0,
                    error: Some(err.into()),
                };
                (outcome, Vec::new())
            }
            Err(_) => {
                tracing::warn!(
                    sub_query = %label,
                    timeout_secs = self.settings.fetch_timeout.as_secs_f64(),
                    "Sub-query timed out"
                );
                let outcome = FetchOutcome {
                    label,
                    status: FetchStatus::TimedOut,
                    count: 0,
                    error: Some(AnalysisError::new(
                        ErrorKind::UpstreamFetchFailure,
                        "fetch timed out",
                    )),
                };
                (outcome, Vec::new())
            }
        }
    }
}

fn joined<T>(analysis: &str, result: std::result::Result<Result<T>, JoinError>) -> Section<T> {
    match result {
        Ok(result) => Section::from(result),
        Err(err) => {
            tracing::warn!(analysis, error = %err, "Analysis task did not complete");
            Section::failed(AnalysisError::new(
                ErrorKind::Internal,
                format!("{} did not complete: {}", analysis, err),
            ))
        }
    }
}

fn build_summary(intent: &IntentResult, data: DataSummary, fetches: &[FetchOutcome]) -> QuerySummary {
    let summary = if data.has_data() {
        format!("Analysis of {} ocean profiles", data.total_profiles)
    } else {
        "No data available for analysis".to_string()
    };

    let mut insights = Vec::new();
    if intent.primary_intent == Intent::SpatialAnalysis {
        insights.push(SPATIAL_INSIGHT.to_string());
    }
    if fetches.iter().any(|f| matches!(f.status, FetchStatus::Failed | FetchStatus::TimedOut)) {
        insights.push(PARTIAL_DATA_INSIGHT.to_string());
    }

    let mut recommendations = Vec::new();
    if intent.complexity_tier == ComplexityTier::High {
        recommendations.push(SPLIT_RECOMMENDATION.to_string());
    }

    QuerySummary { summary, data, insights, recommendations }
}

//! Query decomposition.
//!
//! Long time windows are split into consecutive chunks and effectively global
//! polygons into fixed ocean-basin boxes, so that no single upstream request
//! covers more than the source handles comfortably. Chunking is checked first;
//! the two never combine.

use chrono::Duration;
use oceanlens_core::config::EngineSettings;
use oceanlens_core::error::{OceanError, Result};
use oceanlens_core::models::{format_timestamp, BoundingBox, Region, TimeWindow};
use serde::Serialize;

/// Minimum vertex count for a polygon to be treated as global
const GLOBAL_MIN_VERTICES: usize = 4;
const GLOBAL_LON_SPAN: f64 = 300.0;
const GLOBAL_LAT_SPAN: f64 = 150.0;

/// Basin boxes as (name, north, south, east, west)
const OCEAN_BASINS: &[(&str, f64, f64, f64, f64)] = &[
    ("North Atlantic", 70.0, 20.0, -10.0, -80.0),
    ("North Pacific", 70.0, 20.0, -120.0, 120.0),
    ("South Atlantic", 0.0, -60.0, 20.0, -60.0),
    ("South Pacific", 0.0, -60.0, 120.0, -120.0),
    ("Indian Ocean", 30.0, -60.0, 120.0, 20.0),
];

/// The five fixed basin boxes a global region is replaced with
pub fn ocean_basins() -> Vec<BoundingBox> {
    OCEAN_BASINS
        .iter()
        .map(|&(name, north, south, east, west)| BoundingBox::named(name, north, south, east, west))
        .collect()
}

/// One upstream request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubQuery {
    pub region: Region,
    pub window: TimeWindow,
}

impl SubQuery {
    /// Short label for logs and fetch outcomes
    pub fn label(&self) -> String {
        match self.region.name() {
            Some(name) => name.to_string(),
            None => format!(
                "{}..{}",
                format_timestamp(&self.window.start),
                format_timestamp(&self.window.end)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Single,
    Chunked,
    Regional,
}

/// Decomposition strategy for a spatiotemporal request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryPlan {
    /// The request as given
    Single { region: Region, window: TimeWindow },

    /// Same region, consecutive `[start, end)` sub-windows
    Chunked { region: Region, chunks: Vec<TimeWindow> },

    /// Same window, one request per ocean basin
    Regional { window: TimeWindow, basins: Vec<BoundingBox> },
}

impl QueryPlan {
    pub fn kind(&self) -> PlanKind {
        match self {
            QueryPlan::Single { .. } => PlanKind::Single,
            QueryPlan::Chunked { .. } => PlanKind::Chunked,
            QueryPlan::Regional { .. } => PlanKind::Regional,
        }
    }

    /// Flatten the plan into the requests to issue
    pub fn sub_queries(&self) -> Vec<SubQuery> {
        match self {
            QueryPlan::Single { region, window } => {
                vec![SubQuery { region: region.clone(), window: *window }]
            }
            QueryPlan::Chunked { region, chunks } => chunks
                .iter()
                .map(|window| SubQuery { region: region.clone(), window: *window })
                .collect(),
            QueryPlan::Regional { window, basins } => basins
                .iter()
                .map(|bbox| SubQuery { region: Region::Bounds(bbox.clone()), window: *window })
                .collect(),
        }
    }
}

/// Splits requests according to the configured window limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decomposer {
    max_window_days: i64,
    chunk_days: i64,
}

impl Default for Decomposer {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

impl Decomposer {
    pub fn new(max_window_days: i64, chunk_days: i64) -> Result<Self> {
        if chunk_days <= 0 {
            return Err(OceanError::InvalidInput {
                reason: format!("chunk length must be positive, got {} days", chunk_days),
            });
        }
        Ok(Self { max_window_days, chunk_days })
    }

    /// Build from validated engine settings
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self { max_window_days: settings.max_window_days, chunk_days: settings.chunk_days.max(1) }
    }

    pub fn decompose(&self, region: &Region, window: &TimeWindow) -> Result<QueryPlan> {
        region.validate()?;
        if window.start > window.end {
            return Err(OceanError::InvalidTimeRange {
                reason: format!(
                    "start {} is after end {}",
                    format_timestamp(&window.start),
                    format_timestamp(&window.end)
                ),
            });
        }

        if window.span_days() > self.max_window_days {
            let chunks = self.chunk(window);
            tracing::info!(
                span_days = window.span_days(),
                chunks = chunks.len(),
                "Decomposed long time window into chunks"
            );
            return Ok(QueryPlan::Chunked { region: region.clone(), chunks });
        }

        if is_effectively_global(region) {
            let basins = ocean_basins();
            tracing::info!(basins = basins.len(), "Decomposed global region into ocean basins");
            return Ok(QueryPlan::Regional { window: *window, basins });
        }

        tracing::debug!("Query needs no decomposition");
        Ok(QueryPlan::Single { region: region.clone(), window: *window })
    }

    /// Decompose from raw inputs: a polygon as JSON `[lon, lat]` pairs or
    /// GeoJSON, and start/end timestamp strings
    pub fn decompose_raw(&self, polygon: &str, start: &str, end: &str) -> Result<QueryPlan> {
        let window = TimeWindow::parse(start, end)?;
        let region = if polygon.trim_start().starts_with('[') {
            Region::from_json(polygon)?
        } else {
            Region::from_geojson(polygon)?
        };
        self.decompose(&region, &window)
    }

    fn chunk(&self, window: &TimeWindow) -> Vec<TimeWindow> {
        let step = Duration::days(self.chunk_days);
        let mut chunks = Vec::new();
        let mut start = window.start;
        while start < window.end {
            let end = (start + step).min(window.end);
            chunks.push(TimeWindow { start, end });
            start = end;
        }
        chunks
    }
}

/// Whether a region is treated as covering the whole globe
pub fn is_effectively_global(region: &Region) -> bool {
    region.vertices().len() >= GLOBAL_MIN_VERTICES
        && region.lon_span() > GLOBAL_LON_SPAN
        && region.lat_span() > GLOBAL_LAT_SPAN
}

/// Decompose with the default 365/180 day limits
pub fn decompose(region: &Region, window: &TimeWindow) -> Result<QueryPlan> {
    Decomposer::default().decompose(region, window)
}

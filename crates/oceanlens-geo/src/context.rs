//! Oceanographic context for a map location.
//!
//! Basin, current and climate lookups are ordered rule tables: the first rule
//! whose predicate holds wins.

use oceanlens_core::error::{OceanError, Result};
use oceanlens_core::models::Observation;
use serde::Serialize;
use std::collections::HashSet;

use crate::spatial::polygon_contains;

/// Ocean basin of a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OceanBasin {
    Atlantic,
    Indian,
    Pacific,
    Arctic,
    Southern,
}

type LocationRule = fn(f64, f64) -> bool;

fn mid_latitude_atlantic(lat: f64, lon: f64) -> bool {
    (-60.0..=60.0).contains(&lat) && (-80.0..=20.0).contains(&lon)
}

fn mid_latitude_indian(lat: f64, lon: f64) -> bool {
    (-60.0..=60.0).contains(&lat) && (20.0..=120.0).contains(&lon)
}

fn mid_latitude(lat: f64, _lon: f64) -> bool {
    (-60.0..=60.0).contains(&lat)
}

fn high_north(lat: f64, _lon: f64) -> bool {
    lat > 60.0
}

const BASIN_RULES: &[(LocationRule, OceanBasin)] = &[
    (mid_latitude_atlantic, OceanBasin::Atlantic),
    (mid_latitude_indian, OceanBasin::Indian),
    (mid_latitude, OceanBasin::Pacific),
    (high_north, OceanBasin::Arctic),
];

/// Classify the ocean basin of a location
pub fn classify_basin(lat: f64, lon: f64) -> OceanBasin {
    BASIN_RULES
        .iter()
        .find(|(rule, _)| rule(lat, lon))
        .map(|(_, basin)| *basin)
        .unwrap_or(OceanBasin::Southern)
}

/// Major current systems as (name, lat range, optional lon range)
const CURRENT_SYSTEMS: &[(&str, (f64, f64), Option<(f64, f64)>)] = &[
    ("Gulf Stream", (25.0, 45.0), Some((-80.0, -60.0))),
    ("Kuroshio Current", (20.0, 40.0), Some((120.0, 140.0))),
    ("Equatorial Current System", (-10.0, 10.0), None),
];

/// Current systems near a location
pub fn current_systems(lat: f64, lon: f64) -> Vec<&'static str> {
    CURRENT_SYSTEMS
        .iter()
        .filter(|(_, (lat_lo, lat_hi), lon_range)| {
            lat >= *lat_lo
                && lat <= *lat_hi
                && lon_range.map(|(lo, hi)| lon >= lo && lon <= hi).unwrap_or(true)
        })
        .map(|(name, _, _)| *name)
        .collect()
}

/// Climate zone by absolute latitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClimateZone {
    Tropical,
    Subtropical,
    Temperate,
    Polar,
}

pub fn climate_zone(lat: f64) -> ClimateZone {
    match lat.abs() {
        a if a <= 10.0 => ClimateZone::Tropical,
        a if a <= 30.0 => ClimateZone::Subtropical,
        a if a <= 60.0 => ClimateZone::Temperate,
        _ => ClimateZone::Polar,
    }
}

/// Coarse depth expectation for a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DepthZone {
    /// Deep water (>2000m)
    Deep,
    /// Variable (0-4000m)
    Variable,
}

pub fn depth_zone(lat: f64) -> DepthZone {
    if lat.abs() > 60.0 || (-10.0..=10.0).contains(&lat) {
        DepthZone::Deep
    } else {
        DepthZone::Variable
    }
}

/// Kind of a named oceanographic feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Current,
    Region,
    Sea,
}

/// Named feature outlines as `[lon, lat]` rings
const OCEAN_FEATURES: &[(&str, FeatureKind, [[f64; 2]; 4])] = &[
    (
        "gulf_stream",
        FeatureKind::Current,
        [[-80.0, 25.0], [-60.0, 25.0], [-60.0, 45.0], [-80.0, 45.0]],
    ),
    ("kuroshio", FeatureKind::Current, [[120.0, 20.0], [140.0, 20.0], [140.0, 40.0], [120.0, 40.0]]),
    (
        "equatorial_pacific",
        FeatureKind::Region,
        [[-180.0, -10.0], [180.0, -10.0], [180.0, 10.0], [-180.0, 10.0]],
    ),
    ("arctic", FeatureKind::Region, [[-180.0, 60.0], [180.0, 60.0], [180.0, 90.0], [-180.0, 90.0]]),
    ("mediterranean", FeatureKind::Sea, [[-10.0, 30.0], [40.0, 30.0], [40.0, 45.0], [-10.0, 45.0]]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Medium,
    Moderate,
    High,
}

/// Named features a location falls in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalSignificance {
    pub importance_level: Level,
    pub key_features: Vec<String>,
    pub research_potential: Level,
}

pub fn regional_significance(lat: f64, lon: f64) -> RegionalSignificance {
    let key_features: Vec<String> = OCEAN_FEATURES
        .iter()
        .filter(|(_, _, ring)| polygon_contains(ring, lat, lon))
        .map(|(name, _, _)| name.to_string())
        .collect();

    if key_features.is_empty() {
        RegionalSignificance {
            importance_level: Level::Moderate,
            key_features,
            research_potential: Level::Medium,
        }
    } else {
        RegionalSignificance {
            importance_level: Level::High,
            key_features,
            research_potential: Level::High,
        }
    }
}

/// Full oceanographic context of a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationContext {
    pub ocean_basin: OceanBasin,
    pub current_systems: Vec<String>,
    pub climate_zone: ClimateZone,
    pub depth_zone: DepthZone,
}

pub fn location_context(lat: f64, lon: f64) -> LocationContext {
    LocationContext {
        ocean_basin: classify_basin(lat, lon),
        current_systems: current_systems(lat, lon).into_iter().map(String::from).collect(),
        climate_zone: climate_zone(lat),
        depth_zone: depth_zone(lat),
    }
}

/// Quick coverage check of the observations behind a map selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionQuality {
    pub quality_score: u32,
    pub issues: Vec<String>,
    pub data_points: usize,
    pub temperature_coverage: f64,
    pub salinity_coverage: f64,
}

fn selection_quality(data: &[Observation]) -> SelectionQuality {
    if data.is_empty() {
        return SelectionQuality {
            quality_score: 0,
            issues: vec!["No data available".to_string()],
            data_points: 0,
            temperature_coverage: 0.0,
            salinity_coverage: 0.0,
        };
    }

    let total = data.len() as f64;
    let temperature_coverage = data.iter().filter(|o| o.temperature.is_some()).count() as f64 / total;
    let salinity_coverage = data.iter().filter(|o| o.salinity.is_some()).count() as f64 / total;

    let mut score: i32 = 100;
    let mut issues = Vec::new();

    if temperature_coverage < 0.5 {
        issues.push("Low temperature data coverage".to_string());
        score -= 20;
    }

    if salinity_coverage < 0.5 {
        issues.push("Low salinity data coverage".to_string());
        score -= 20;
    }

    let distinct_dates: HashSet<&str> = data.iter().filter_map(|o| o.timestamp.as_deref()).collect();
    if distinct_dates.len() < 5 {
        issues.push("Limited temporal coverage".to_string());
        score -= 15;
    }

    SelectionQuality {
        quality_score: score.max(0) as u32,
        issues,
        data_points: data.len(),
        temperature_coverage,
        salinity_coverage,
    }
}

/// Recommended analysis focus for a selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSuggestions {
    pub primary_parameters: Vec<String>,
    pub secondary_parameters: Vec<String>,
    pub analysis_types: Vec<String>,
    pub visualizations: Vec<String>,
}

fn suggest_analysis(lat: f64, data: &[Observation]) -> AnalysisSuggestions {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let mut suggestions = AnalysisSuggestions {
        primary_parameters: strings(&["temperature", "salinity"]),
        secondary_parameters: Vec::new(),
        analysis_types: strings(&["spatial_analysis", "temporal_trends"]),
        visualizations: strings(&["scatter_plot", "heat_map"]),
    };

    if lat.abs() <= 10.0 {
        suggestions.secondary_parameters.extend(strings(&["oxygen", "nutrients"]));
        suggestions.analysis_types.push("upwelling_analysis".to_string());
    }

    if lat > 60.0 {
        suggestions.secondary_parameters.extend(strings(&["ice_concentration", "mixing_depth"]));
        suggestions.analysis_types.push("ice_ocean_interaction".to_string());
    }

    let temps: Vec<f64> = data.iter().filter_map(|o| o.temperature).collect();
    if temps.len() >= 2 {
        let (lo, hi) = temps
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| (lo.min(t), hi.max(t)));
        if hi - lo > 10.0 {
            suggestions.analysis_types.push("thermal_front_analysis".to_string());
        }
    }

    suggestions
}

/// Selected point and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectionPoint {
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
}

/// Oceanographic significance of a map selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionAnalysis {
    pub location: SelectionPoint,
    pub oceanographic_context: LocationContext,
    pub data_quality: SelectionQuality,
    pub recommended_analysis: AnalysisSuggestions,
    pub regional_significance: RegionalSignificance,
}

/// Analyze a map selection of `radius` degrees around `(lat, lon)`
pub fn analyze_selection(
    lat: f64,
    lon: f64,
    radius: f64,
    data: &[Observation],
) -> Result<SelectionAnalysis> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(OceanError::InvalidInput { reason: format!("latitude {} out of range", lat) });
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(OceanError::InvalidInput { reason: format!("longitude {} out of range", lon) });
    }
    if !radius.is_finite() || radius < 0.0 {
        return Err(OceanError::InvalidInput { reason: format!("radius {} is invalid", radius) });
    }

    Ok(SelectionAnalysis {
        location: SelectionPoint { lat, lon, radius },
        oceanographic_context: location_context(lat, lon),
        data_quality: selection_quality(data),
        recommended_analysis: suggest_analysis(lat, data),
        regional_significance: regional_significance(lat, lon),
    })
}

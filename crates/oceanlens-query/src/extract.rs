//! Region, parameter and time-window extraction from free-text queries.

use chrono::{DateTime, Utc};
use oceanlens_core::models::{BoundingBox, TimeWindow};
use serde::Serialize;

use crate::text::QueryText;

/// Days covered by the default query window
pub const DEFAULT_WINDOW_DAYS: i64 = 365;

/// Region lookup in priority order: (keyword, name, north, south, east, west)
const REGION_RULES: &[(&str, &str, f64, f64, f64, f64)] = &[
    ("atlantic canada", "Atlantic Canada", 60.0, 43.0, -50.0, -70.0),
    ("north atlantic", "North Atlantic", 45.0, 35.0, -60.0, -80.0),
    ("south atlantic", "South Atlantic", 0.0, -40.0, -20.0, -60.0),
    ("pacific", "Pacific Ocean", 60.0, -60.0, -120.0, 120.0),
    ("equator", "Equatorial Region", 10.0, -10.0, 180.0, -180.0),
    ("gulf stream", "Gulf Stream", 45.0, 25.0, -60.0, -80.0),
];

/// Region used when a query names none
const DEFAULT_REGION: usize = 1;

/// Parameters a query can ask about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryParameter {
    Temperature,
    Salinity,
    Pressure,
    Current,
    Oxygen,
    Chlorophyll,
}

const PARAMETER_RULES: &[(&[&str], QueryParameter)] = &[
    (&["temperature", "temp"], QueryParameter::Temperature),
    (&["salinity", "salt"], QueryParameter::Salinity),
    (&["pressure"], QueryParameter::Pressure),
    (&["current", "velocity"], QueryParameter::Current),
    (&["oxygen"], QueryParameter::Oxygen),
    (&["chlorophyll"], QueryParameter::Chlorophyll),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    DataAnalysis,
    CurrentAnalysis,
    TrendAnalysis,
    GeneralInquiry,
}

const QUERY_TYPE_RULES: &[(&[&str], QueryType)] = &[
    (&["temperature", "temp", "salinity", "salt"], QueryType::DataAnalysis),
    (&["current", "flow", "circulation"], QueryType::CurrentAnalysis),
    (&["anomaly", "trend", "change"], QueryType::TrendAnalysis),
];

/// Queries must be longer than this many characters after trimming
const MIN_QUERY_CHARS: usize = 3;

const VALID_CONFIDENCE: f64 = 0.9;
const INVALID_CONFIDENCE: f64 = 0.3;

const EXAMPLE_QUERIES: &[&str] = &[
    "Try asking about temperature data in the North Atlantic",
    "Ask for salinity patterns near the equator",
    "Request ocean current analysis in the Gulf Stream",
];

fn region_box(index: usize) -> BoundingBox {
    let (_, name, north, south, east, west) = REGION_RULES[index];
    BoundingBox::named(name, north, south, east, west)
}

/// First region named in the text, if any
pub fn match_region(query: &str) -> Option<BoundingBox> {
    let text = QueryText::new(query);
    REGION_RULES
        .iter()
        .position(|(keyword, ..)| text.contains(keyword))
        .map(region_box)
}

/// Region named in the text, North Atlantic when none is
pub fn extract_region(query: &str) -> BoundingBox {
    match_region(query).unwrap_or_else(|| region_box(DEFAULT_REGION))
}

/// Parameters mentioned in the text, temperature and salinity when none are
pub fn extract_parameters(query: &str) -> Vec<QueryParameter> {
    let text = QueryText::new(query);
    let found: Vec<QueryParameter> = PARAMETER_RULES
        .iter()
        .filter(|(keywords, _)| text.contains_any(keywords))
        .map(|(_, parameter)| *parameter)
        .collect();

    if found.is_empty() {
        vec![QueryParameter::Temperature, QueryParameter::Salinity]
    } else {
        found
    }
}

/// The trailing year ending at `now`
pub fn default_time_window(now: DateTime<Utc>) -> TimeWindow {
    TimeWindow::trailing_days(now, DEFAULT_WINDOW_DAYS)
}

pub fn classify_query_type(query: &str) -> QueryType {
    let text = QueryText::new(query);
    QUERY_TYPE_RULES
        .iter()
        .find(|(keywords, _)| text.contains_any(keywords))
        .map(|(_, query_type)| *query_type)
        .unwrap_or(QueryType::GeneralInquiry)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputValidation {
    pub valid: bool,
    pub confidence: f64,
    pub query_type: QueryType,
    pub suggestions: Vec<String>,
}

/// Screen a query before running it
pub fn validate_input(query: &str) -> InputValidation {
    let valid = query.trim().chars().count() > MIN_QUERY_CHARS;
    InputValidation {
        valid,
        confidence: if valid { VALID_CONFIDENCE } else { INVALID_CONFIDENCE },
        query_type: classify_query_type(query),
        suggestions: if valid {
            Vec::new()
        } else {
            EXAMPLE_QUERIES.iter().map(|s| s.to_string()).collect()
        },
    }
}

//! Intent and complexity classification of free-text queries.
//!
//! Classification is a fold over fixed, ordered keyword tables. The first
//! intent whose keywords match becomes the primary intent.

use serde::Serialize;

use crate::text::QueryText;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SpatialAnalysis,
    TemporalAnalysis,
    ParameterAnalysis,
    ComparativeAnalysis,
    PredictiveAnalysis,
    GeneralInquiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Basic,
    Medium,
    High,
}

/// Analysis a query needs beyond plain retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    MultiParameterAnalysis,
    TemporalAnalysis,
    SpatialAnalysis,
}

/// Intent rules in priority order
const INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::SpatialAnalysis,
        &[
            "spatial",
            "regional",
            "area",
            "location",
            "coordinates",
            "gulf stream",
            "kuroshio",
            "equatorial",
            "polar",
        ],
    ),
    (
        Intent::TemporalAnalysis,
        &[
            "temporal",
            "time",
            "seasonal",
            "trend",
            "change over time",
            "anomaly",
            "variability",
            "cycle",
        ],
    ),
    (
        Intent::ParameterAnalysis,
        &[
            "temperature",
            "salinity",
            "current",
            "oxygen",
            "nutrients",
            "chlorophyll",
            "ph",
            "pressure",
        ],
    ),
    (
        Intent::ComparativeAnalysis,
        &[
            "compare",
            "versus",
            "difference",
            "contrast",
            "relationship",
            "correlation",
            "association",
        ],
    ),
    (
        Intent::PredictiveAnalysis,
        &["predict", "forecast", "future", "projection", "model", "simulation", "scenario"],
    ),
];

const TECHNICAL_TERMS: &[&str] = &[
    "thermohaline",
    "upwelling",
    "downwelling",
    "gyre",
    "eddy",
    "mesoscale",
    "submesoscale",
    "stratification",
    "mixing",
];

const PARAMETER_TERMS: &[&str] = &["temperature", "salinity", "current", "oxygen", "nutrients"];

/// Score contributions, each tagging a requirement when it fires
const REQUIREMENT_RULES: &[(Requirement, &[&str], u32)] = &[
    (Requirement::TemporalAnalysis, &["trend", "anomaly", "variability"], 15),
    (Requirement::SpatialAnalysis, &["spatial", "regional", "correlation"], 15),
];

const LONG_QUERY_WORDS: usize = 20;
const MEDIUM_QUERY_WORDS: usize = 10;
const TECHNICAL_TERM_SCORE: u32 = 10;
const MULTI_PARAMETER_COUNT: usize = 3;
const MULTI_PARAMETER_SCORE: u32 = 20;
const HIGH_TIER_SCORE: u32 = 50;
const MEDIUM_TIER_SCORE: u32 = 25;

pub const SPLIT_SUGGESTION: &str = "Consider breaking into multiple focused queries";
pub const REGION_SUGGESTION: &str = "Specify geographic region for better data retrieval";
pub const TIME_RANGE_SUGGESTION: &str = "Define specific time range for analysis";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentResult {
    pub primary_intent: Intent,
    pub secondary_intents: Vec<Intent>,
    pub complexity_tier: ComplexityTier,
    pub complexity_score: u32,
    pub requirements: Vec<Requirement>,
    pub optimization_suggestions: Vec<String>,
}

/// Complexity score and the requirements that contributed to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complexity {
    pub score: u32,
    pub tier: ComplexityTier,
    pub requirements: Vec<Requirement>,
}

pub fn analyze_complexity(text: &QueryText) -> Complexity {
    let mut score = 0;
    let mut requirements = Vec::new();

    let words = text.word_count();
    if words > LONG_QUERY_WORDS {
        score += 30;
    } else if words > MEDIUM_QUERY_WORDS {
        score += 15;
    }

    score += text.count_matches(TECHNICAL_TERMS) as u32 * TECHNICAL_TERM_SCORE;

    if text.count_matches(PARAMETER_TERMS) >= MULTI_PARAMETER_COUNT {
        score += MULTI_PARAMETER_SCORE;
        requirements.push(Requirement::MultiParameterAnalysis);
    }

    for (requirement, keywords, points) in REQUIREMENT_RULES {
        if text.contains_any(keywords) {
            score += points;
            requirements.push(*requirement);
        }
    }

    let tier = if score >= HIGH_TIER_SCORE {
        ComplexityTier::High
    } else if score >= MEDIUM_TIER_SCORE {
        ComplexityTier::Medium
    } else {
        ComplexityTier::Basic
    };

    Complexity { score, tier, requirements }
}

/// Classify the intent and complexity of a query
pub fn classify_intent(query: &str) -> IntentResult {
    let text = QueryText::new(query);

    let (primary, secondary) = INTENT_RULES.iter().filter(|(_, keywords)| text.contains_any(keywords)).fold(
        (None, Vec::new()),
        |(primary, mut secondary), (intent, _)| match primary {
            None => (Some(*intent), secondary),
            Some(first) => {
                secondary.push(*intent);
                (Some(first), secondary)
            }
        },
    );
    let primary_intent = primary.unwrap_or(Intent::GeneralInquiry);

    let complexity = analyze_complexity(&text);

    let mut optimization_suggestions = Vec::new();
    if complexity.tier == ComplexityTier::High {
        optimization_suggestions.push(SPLIT_SUGGESTION.to_string());
    }
    match primary_intent {
        Intent::SpatialAnalysis => optimization_suggestions.push(REGION_SUGGESTION.to_string()),
        Intent::TemporalAnalysis => optimization_suggestions.push(TIME_RANGE_SUGGESTION.to_string()),
        _ => {}
    }

    IntentResult {
        primary_intent,
        secondary_intents: secondary,
        complexity_tier: complexity.tier,
        complexity_score: complexity.score,
        requirements: complexity.requirements,
        optimization_suggestions,
    }
}

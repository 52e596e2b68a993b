//! OceanLens Query - Query understanding, decomposition and the engine pipeline
//!
//! Free-text queries are classified and mapped to a region and time window,
//! decomposed into upstream requests, fetched concurrently and analyzed.

pub mod cache;
pub mod decompose;
pub mod extract;
pub mod intent;
pub mod pipeline;
pub mod text;

pub use cache::{Clock, ManualClock, QueryCache, SystemClock};
pub use decompose::{decompose, ocean_basins, Decomposer, PlanKind, QueryPlan, SubQuery};
pub use extract::{
    classify_query_type, default_time_window, extract_parameters, extract_region, match_region,
    validate_input, InputValidation, QueryParameter, QueryType,
};
pub use intent::{classify_intent, ComplexityTier, Intent, IntentResult, Requirement};
pub use pipeline::{
    AnalysisSections, FetchOutcome, FetchStatus, OceanQueryEngine, OceanQueryReport,
    RegionalMetrics,
};

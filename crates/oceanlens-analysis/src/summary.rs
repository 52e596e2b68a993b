use oceanlens_core::models::Observation;
use serde::Serialize;

use crate::stats::{describe, Describe};

/// Headline statistics of an observation set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_profiles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Describe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salinity: Option<Describe>,
}

impl DataSummary {
    pub fn has_data(&self) -> bool {
        self.total_profiles > 0
    }
}

pub fn summarize(observations: &[Observation]) -> DataSummary {
    let temps: Vec<f64> = observations.iter().filter_map(|o| o.temperature).collect();
    let salinities: Vec<f64> = observations.iter().filter_map(|o| o.salinity).collect();

    DataSummary {
        total_profiles: observations.len(),
        temperature: describe(&temps),
        salinity: describe(&salinities),
    }
}

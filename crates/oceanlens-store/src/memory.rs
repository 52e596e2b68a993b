//! In-memory observation source for development and testing.
//!
//! Lock poisoning is recovered from by taking the inner value; the stored
//! observations are only ever replaced wholesale, so a poisoned lock still
//! holds a consistent vector.

use async_trait::async_trait;
use oceanlens_core::error::{OceanError, Result};
use oceanlens_core::models::{Observation, Region, TimeWindow};
use oceanlens_core::ports::ObservationSource;
use oceanlens_geo::spatial::region_contains;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// In-memory implementation of ObservationSource
#[derive(Debug, Clone)]
pub struct MemoryObservationSource {
    name: String,
    observations: Arc<RwLock<Vec<Observation>>>,
    failure: Arc<RwLock<Option<String>>>,
    failing_regions: Arc<RwLock<HashSet<String>>>,
    latency: Option<Duration>,
    fetches: Arc<AtomicUsize>,
}

impl Default for MemoryObservationSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemoryObservationSource {
    /// Create a source serving the given observations
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            name: "memory".to_string(),
            observations: Arc::new(RwLock::new(observations)),
            failure: Arc::new(RwLock::new(None)),
            failing_regions: Arc::new(RwLock::new(HashSet::new())),
            latency: None,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Delay every fetch, for exercising timeouts
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every fetch fail with `reason`
    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        self.set_failure(Some(reason.into()));
        self
    }

    pub fn set_failure(&self, reason: Option<String>) {
        *self.failure.write().unwrap_or_else(|e| e.into_inner()) = reason;
    }

    /// Make fetches for the named bounding box fail
    pub fn fail_region(&self, name: impl Into<String>) {
        self.failing_regions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into());
    }

    /// Replace the served observations
    pub fn replace(&self, observations: Vec<Observation>) {
        *self.observations.write().unwrap_or_else(|e| e.into_inner()) = observations;
    }

    /// Number of fetch calls made so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_failure(&self, region: &Region) -> Result<()> {
        if let Some(reason) = self.failure.read().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(OceanError::UpstreamFetchFailure { source_name: self.name.clone(), reason });
        }

        if let Some(name) = region.name() {
            let failing = self.failing_regions.read().unwrap_or_else(|e| e.into_inner());
            if failing.contains(name) {
                return Err(OceanError::UpstreamFetchFailure {
                    source_name: self.name.clone(),
                    reason: format!("region {} unavailable", name),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObservationSource for MemoryObservationSource {
    async fn fetch(&self, region: &Region, window: &TimeWindow) -> Result<Vec<Observation>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_failure(region)?;

        let observations = self.observations.read().unwrap_or_else(|e| e.into_inner());
        let matched: Vec<Observation> = observations
            .iter()
            .filter(|o| {
                o.coordinates()
                    .map(|(lat, lon)| region_contains(region, lat, lon))
                    .unwrap_or(false)
            })
            .filter(|o| o.parsed_timestamp().map(|t| window.contains(&t)).unwrap_or(false))
            .cloned()
            .collect();

        tracing::debug!(
            source = %self.name,
            region = region.name().unwrap_or("polygon"),
            matched = matched.len(),
            "Served observations from memory"
        );
        Ok(matched)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

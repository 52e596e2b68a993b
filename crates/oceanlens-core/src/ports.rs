//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Observation, Region, TimeWindow};

/// Port for the remote oceanographic data source
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetch observations inside a region and time window
    async fn fetch(&self, region: &Region, window: &TimeWindow) -> Result<Vec<Observation>>;

    /// Short name used in logs and fetch reports
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ObservationSource + ?Sized> ObservationSource for Arc<T> {
    async fn fetch(&self, region: &Region, window: &TimeWindow) -> Result<Vec<Observation>> {
        (**self).fetch(region, window).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

pub mod observation;
pub mod region;
pub mod section;
pub mod window;

pub use observation::{Observation, ObservationBatch, Parameter, SkippedRecord};
pub use region::{BoundingBox, Region};
pub use section::{AnalysisError, Section};
pub use window::{format_timestamp, parse_timestamp, TimeWindow};

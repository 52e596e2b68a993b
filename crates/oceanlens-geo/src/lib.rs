//! OceanLens Geo - Planar geometry and oceanographic location context
//!
//! This crate handles point-in-region tests, degree-space extents and the
//! basin/current/feature lookups used to describe a map location.

pub mod context;
pub mod planar;
pub mod spatial;

pub use context::{analyze_selection, location_context, LocationContext, SelectionAnalysis};
pub use planar::{planar_distance, CoordinateExtent};
pub use spatial::{polygon_contains, region_contains};

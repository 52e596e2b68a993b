//! OceanLens Store - Observation source adapters
//!
//! This crate provides implementations of the `ObservationSource` port.

pub mod memory;

pub use memory::MemoryObservationSource;

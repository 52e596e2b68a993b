//! OceanLens Core - Domain models, error taxonomy, and configuration
//!
//! This crate contains the observation model and the port definitions shared by
//! the analysis and query crates.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{ErrorKind, OceanError, Result};

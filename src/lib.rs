//! HierMeasure host library
//!
//! Exposes the host modules for the command line binary and integration tests

pub mod config;
pub mod errors;
pub mod host;
pub mod metrics;

pub use config::HostConfig;
pub use errors::HostError;
pub use host::{MeasureHost, Selection};

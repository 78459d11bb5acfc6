//! Error handling module
//!
//! Unifies the errors of the crates the measure host is built from.

use hiermeasure_catalog::CatalogError;
use hiermeasure_core_types::HierarchyError;
use hiermeasure_scheduler::SchedulerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    /// Invalid host configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("invalid hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

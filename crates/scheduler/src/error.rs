use hiermeasure_core_types::MeasureError;
use hiermeasure_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("compute queue is shut down")]
    QueueClosed,
    #[error("evaluation task aborted: {0}")]
    Join(String),
    #[error("failed to write measure dump: {0}")]
    Dump(#[from] csv::Error),
    #[error("failed to write measure dump: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SchedulerError> for MeasureError {
    fn from(value: SchedulerError) -> Self {
        MeasureError::new(value.to_string())
    }
}

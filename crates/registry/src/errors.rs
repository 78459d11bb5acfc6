use hiermeasure_core_types::MeasureError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("measure not found: {0}")]
    NotFound(String),
    #[error("duplicate measure identifier: {0}")]
    DuplicateIdentifier(String),
    #[error("invalid descriptor '{id}': {reason}")]
    Configuration { id: String, reason: String },
}

impl RegistryError {
    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl From<RegistryError> for MeasureError {
    fn from(value: RegistryError) -> Self {
        MeasureError::new(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_measure_error_with_its_message() {
        let err: MeasureError = RegistryError::DuplicateIdentifier("Height".to_string()).into();
        assert_eq!(err, MeasureError::new("duplicate measure identifier: Height"));
    }
}

use hiermeasure_core_types::MeasureError;
use hiermeasure_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid measure manifest '{id}': {reason}")]
    Configuration { id: String, reason: String },
    #[error("no installed measure library supports '{id}'")]
    UnsupportedMeasure { id: String },
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl CatalogError {
    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(id: impl Into<String>) -> Self {
        Self::UnsupportedMeasure { id: id.into() }
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            reason: format!("{}", err),
        }
    }

    pub(crate) fn parse(path: impl AsRef<std::path::Path>, err: serde_yaml::Error) -> Self {
        Self::Parse {
            path: path.as_ref().display().to_string(),
            reason: format!("{}", err),
        }
    }
}

impl From<CatalogError> for MeasureError {
    fn from(value: CatalogError) -> Self {
        MeasureError::new(value.to_string())
    }
}

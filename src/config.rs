//! Host configuration
//!
//! Loaded from YAML; every field has a default so an absent file is a valid
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use hiermeasure_registry::DuplicatePolicy;
use hiermeasure_scheduler::BatchOptions;
use serde::{Deserialize, Serialize};

use crate::errors::HostError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Manifest files or directories installed after the built-in set.
    pub catalog_paths: Vec<PathBuf>,
    /// Install the built-in measures the available libraries can provide.
    pub include_builtin: bool,
    /// How conflicting registrations of one identifier are resolved.
    pub duplicate_policy: DuplicatePolicy,
    /// Maximum number of measures evaluated at the same time.
    pub parallelism: usize,
    /// Per-measure time limit in humantime notation, e.g. `30s`.
    pub timeout: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            catalog_paths: Vec::new(),
            include_builtin: true,
            duplicate_policy: DuplicatePolicy::Reject,
            parallelism: 1,
            timeout: None,
        }
    }
}

impl HostConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, HostError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: HostConfig =
            serde_yaml::from_str(raw).map_err(|err| HostError::config(format!("{}", err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HostError> {
        if self.parallelism == 0 {
            return Err(HostError::config("parallelism must be at least 1"));
        }
        self.timeout()?;
        Ok(())
    }

    pub fn timeout(&self) -> Result<Option<Duration>, HostError> {
        self.timeout
            .as_deref()
            .map(|raw| {
                humantime::parse_duration(raw)
                    .map_err(|err| HostError::config(format!("timeout '{}': {}", raw, err)))
            })
            .transpose()
    }

    pub fn batch_options(&self) -> Result<BatchOptions, HostError> {
        let options = BatchOptions::default().with_parallelism(self.parallelism);
        Ok(match self.timeout()? {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = HostConfig::from_yaml_str("").unwrap();
        assert_eq!(config, HostConfig::default());
        assert!(config.include_builtin);
        assert_eq!(config.parallelism, 1);
    }

    #[test]
    fn parses_all_fields() {
        let config = HostConfig::from_yaml_str(
            "catalog_paths: [measures/]\ninclude_builtin: false\nduplicate_policy: last_wins\nparallelism: 4\ntimeout: 1m 30s\n",
        )
        .unwrap();
        assert_eq!(config.catalog_paths, vec![PathBuf::from("measures/")]);
        assert!(!config.include_builtin);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::LastWins);
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_secs(90)));
        let options = config.batch_options().unwrap();
        assert_eq!(options.parallelism, 4);
        assert_eq!(options.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(HostConfig::from_yaml_str("parallelism: 0\n").is_err());
        assert!(HostConfig::from_yaml_str("timeout: soon\n").is_err());
        assert!(HostConfig::from_yaml_str("workers: 2\n").is_err());
    }
}

use std::sync::Arc;

use hiermeasure_registry::{RegisterOutcome, Registry};
use tracing::{info, warn};

use crate::defaults::default_manifests;
use crate::errors::CatalogError;
use crate::factory::build_descriptor;
use crate::library::MeasureLibrary;
use crate::loader::LoadedManifests;
use crate::manifest::MeasureManifest;

/// Result of installing a batch of manifests.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub installed: Vec<(String, RegisterOutcome)>,
    pub rejected: Vec<(String, CatalogError)>,
}

impl InstallReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn merge(&mut self, other: InstallReport) {
        self.installed.extend(other.installed);
        self.rejected.extend(other.rejected);
    }
}

/// Builds and registers every manifest. A manifest that fails is logged and
/// recorded; the remaining ones are still installed.
pub fn install<R, L>(registry: &R, manifests: Vec<MeasureManifest>, library: Arc<L>) -> InstallReport
where
    R: Registry + ?Sized,
    L: MeasureLibrary + ?Sized + 'static,
{
    let mut report = InstallReport::default();
    for manifest in manifests {
        let result = build_descriptor(&manifest, Arc::clone(&library))
            .and_then(|descriptor| registry.register(descriptor).map_err(CatalogError::from));
        match result {
            Ok(outcome) => report.installed.push((manifest.id, outcome)),
            Err(err) => {
                warn!(target: "catalog", measure = %manifest.id, error = %err, "measure manifest rejected");
                report.rejected.push((manifest.id, err));
            }
        }
    }
    info!(
        target: "catalog",
        installed = report.installed.len(),
        rejected = report.rejected.len(),
        "measure manifests installed"
    );
    report
}

/// Installs the manifests a loader produced. Entries the loader rejected are
/// carried into the report ahead of the installation outcomes.
pub fn install_loaded<R, L>(registry: &R, loaded: LoadedManifests, library: Arc<L>) -> InstallReport
where
    R: Registry + ?Sized,
    L: MeasureLibrary + ?Sized + 'static,
{
    let mut report = InstallReport {
        installed: Vec::new(),
        rejected: loaded.rejected,
    };
    report.merge(install(registry, loaded.manifests, library));
    report
}

/// Installs the built-in measure set, limited to the kinds `library` can
/// provide.
pub fn install_builtin<R, L>(registry: &R, library: Arc<L>) -> InstallReport
where
    R: Registry + ?Sized,
    L: MeasureLibrary + ?Sized + 'static,
{
    let (supported, unavailable): (Vec<_>, Vec<_>) = default_manifests()
        .into_iter()
        .partition(|manifest| library.supports(&manifest.measure));
    if !unavailable.is_empty() {
        info!(
            target: "catalog",
            skipped = unavailable.len(),
            library = library.name(),
            "built-in measures without a providing library were skipped"
        );
    }
    install(registry, supported, library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{EntropyOptions, MeasureKind};
    use crate::structural::StructuralLibrary;
    use hiermeasure_registry::{RegistryError, RegistryImpl};

    #[test]
    fn failures_do_not_block_other_manifests() {
        let registry = RegistryImpl::new();
        let manifests = vec![
            MeasureManifest::new("Height", MeasureKind::Height),
            MeasureManifest::new("Flat Entropy 1", MeasureKind::FlatEntropy(EntropyOptions { variant: 1 })),
            MeasureManifest::new("Broken", MeasureKind::FlatEntropy(EntropyOptions { variant: 9 })),
            MeasureManifest::new("Number of Nodes", MeasureKind::NumberOfNodes),
        ];
        let report = install(&registry, manifests, Arc::new(StructuralLibrary));

        assert_eq!(registry.len(), 2);
        assert_eq!(
            report.installed,
            vec![
                ("Height".to_string(), RegisterOutcome::Inserted),
                ("Number of Nodes".to_string(), RegisterOutcome::Inserted),
            ]
        );
        assert!(matches!(
            report.rejected[0].1,
            CatalogError::UnsupportedMeasure { .. }
        ));
        assert!(matches!(
            report.rejected[1].1,
            CatalogError::Configuration { .. }
        ));
    }

    #[test]
    fn reinstalling_is_idempotent_but_conflicts_are_rejected() {
        let registry = RegistryImpl::new();
        let library = Arc::new(StructuralLibrary);
        install(&registry, vec![MeasureManifest::new("Height", MeasureKind::Height)], Arc::clone(&library));

        let again = install(&registry, vec![MeasureManifest::new("Height", MeasureKind::Height)], Arc::clone(&library));
        assert_eq!(again.installed[0].1, RegisterOutcome::Unchanged);

        let conflict = install(
            &registry,
            vec![MeasureManifest::new("Height", MeasureKind::NumberOfLeaves)],
            library,
        );
        assert_eq!(
            conflict.rejected[0].1,
            CatalogError::Registry(RegistryError::DuplicateIdentifier("Height".to_string()))
        );
    }

    #[test]
    fn builtin_install_keeps_supported_statistics() {
        let registry = RegistryImpl::new();
        let report = install_builtin(&registry, Arc::new(StructuralLibrary));
        assert!(report.is_clean());
        assert_eq!(registry.len(), 9);
        assert_eq!(
            registry.groups(),
            ["/internal/statistics", "/internal/statistics/histogram"]
        );
    }
}

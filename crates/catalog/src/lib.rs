//! Declarative measure catalog.
//!
//! Measures are described by [`MeasureManifest`]s, either the built-in set
//! from [`default_manifests`] or YAML files on disk, and bound to algorithms
//! supplied by a [`MeasureLibrary`].

pub mod defaults;
pub mod errors;
pub mod factory;
pub mod install;
pub mod library;
pub mod loader;
pub mod manifest;
pub mod structural;

pub use defaults::default_manifests;
pub use errors::CatalogError;
pub use factory::build_descriptor;
pub use install::{install, install_builtin, install_loaded, InstallReport};
pub use library::{LibraryChain, MeasureLibrary};
pub use loader::{load_manifest_dir, load_manifest_file, load_manifest_path, LoadedManifests};
pub use manifest::{
    Distance, DistanceOptions, DunnOptions, EntropyOptions, FMeasureOptions,
    HierarchicalInternalOptions, InformationGainOptions, InheritanceOptions, LogBaseOptions,
    MeasureFamily, MeasureKind, MeasureManifest, Pairing, PairingOptions, VarianceOptions,
};
pub use structural::StructuralLibrary;

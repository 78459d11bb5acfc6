use std::sync::Arc;

use hiermeasure_registry::{MeasureDescriptor, DEFAULT_GROUP};
use tracing::debug;

use crate::errors::CatalogError;
use crate::library::MeasureLibrary;
use crate::manifest::MeasureManifest;

/// Turns a manifest into a registrable descriptor.
///
/// The manifest is validated and the library must claim its measure kind,
/// but the implementation itself is only built the first time the
/// descriptor is evaluated.
pub fn build_descriptor<L>(
    manifest: &MeasureManifest,
    library: Arc<L>,
) -> Result<MeasureDescriptor, CatalogError>
where
    L: MeasureLibrary + ?Sized + 'static,
{
    manifest.validate()?;
    if !library.supports(&manifest.measure) {
        return Err(CatalogError::unsupported(&manifest.id));
    }

    let definition = manifest.canonical()?;
    let kind = manifest.measure.clone();
    let id = manifest.id.clone();
    let group = manifest
        .group
        .clone()
        .unwrap_or_else(|| DEFAULT_GROUP.to_string());

    let builder = MeasureDescriptor::builder(manifest.id.as_str())
        .group(group)
        .auto_compute(manifest.auto_compute)
        .projection(manifest.projection)
        .definition(definition)
        .factory(move || {
            debug!(target: "catalog", measure = %id, kind = kind.name(), library = library.name(), "constructing measure");
            library.instantiate(&kind)
        });
    let builder = if manifest.requires_ground_truth() {
        builder.requires_ground_truth()
    } else {
        builder
    };
    Ok(builder.build()?)
}

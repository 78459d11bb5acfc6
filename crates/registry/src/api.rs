use std::sync::Arc;

use hiermeasure_core_types::{Hierarchy, MeasureId};

use crate::errors::RegistryError;
use crate::model::{MeasureDescriptor, RegisterOutcome};

/// Registration-ordered collection of measure descriptors.
///
/// Every accessor returns descriptors in the order they were first
/// registered. Listing never constructs a measure implementation.
pub trait Registry: Send + Sync {
    fn register(&self, descriptor: MeasureDescriptor) -> Result<RegisterOutcome, RegistryError>;

    fn all(&self) -> Vec<Arc<MeasureDescriptor>>;

    fn by_id(&self, id: &MeasureId) -> Result<Arc<MeasureDescriptor>, RegistryError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct group paths, sorted.
    fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self
            .all()
            .iter()
            .map(|descriptor| descriptor.group().to_string())
            .collect();
        groups.sort();
        groups.dedup();
        groups
    }

    /// Descriptors of one group; `NotFound` when no descriptor carries it.
    fn group(&self, group: &str) -> Result<Vec<Arc<MeasureDescriptor>>, RegistryError> {
        let members = self.filter(&|descriptor| descriptor.group() == group);
        if members.is_empty() {
            return Err(RegistryError::NotFound(format!("group {group}")));
        }
        Ok(members)
    }

    fn filter(&self, predicate: &dyn Fn(&MeasureDescriptor) -> bool) -> Vec<Arc<MeasureDescriptor>> {
        self.all()
            .into_iter()
            .filter(|descriptor| predicate(descriptor))
            .collect()
    }

    /// Auto-compute descriptors that are applicable to `hierarchy`.
    fn auto_compute(&self, hierarchy: &dyn Hierarchy) -> Vec<Arc<MeasureDescriptor>> {
        self.filter(&|descriptor| descriptor.auto_compute() && descriptor.is_applicable(hierarchy))
    }
}

impl<R> Registry for Arc<R>
where
    R: Registry + ?Sized,
{
    fn register(&self, descriptor: MeasureDescriptor) -> Result<RegisterOutcome, RegistryError> {
        (**self).register(descriptor)
    }

    fn all(&self) -> Vec<Arc<MeasureDescriptor>> {
        (**self).all()
    }

    fn by_id(&self, id: &MeasureId) -> Result<Arc<MeasureDescriptor>, RegistryError> {
        (**self).by_id(id)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

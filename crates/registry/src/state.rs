use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use hiermeasure_core_types::MeasureId;

use crate::{
    api::Registry,
    errors::RegistryError,
    metrics,
    model::{DuplicatePolicy, MeasureDescriptor, RegisterOutcome},
};

#[derive(Default)]
struct Inner {
    order: Vec<Arc<MeasureDescriptor>>,
    index: HashMap<MeasureId, usize>,
}

static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(1);

/// In-memory registry. Registration is expected at startup; reads may run
/// concurrently with evaluation afterwards.
///
/// Each instance reports its descriptor count under its own `registry`
/// metric label, removed again when the instance is dropped.
pub struct RegistryImpl {
    inner: RwLock<Inner>,
    policy: DuplicatePolicy,
    label: String,
}

impl Default for RegistryImpl {
    fn default() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }
}

impl RegistryImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        let label = format!("registry-{}", NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed));
        metrics::set_descriptor_count(&label, 0);
        Self {
            inner: RwLock::new(Inner::default()),
            policy,
            label,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Value of the `registry` label this instance reports metrics under.
    pub fn metrics_label(&self) -> &str {
        &self.label
    }

    /// Registers every descriptor, stopping at the first error.
    pub fn register_all<I>(&self, descriptors: I) -> Result<Vec<RegisterOutcome>, RegistryError>
    where
        I: IntoIterator<Item = MeasureDescriptor>,
    {
        descriptors
            .into_iter()
            .map(|descriptor| self.register(descriptor))
            .collect()
    }
}

impl Drop for RegistryImpl {
    fn drop(&mut self) {
        metrics::forget_registry(&self.label);
    }
}

impl Registry for RegistryImpl {
    fn register(&self, descriptor: MeasureDescriptor) -> Result<RegisterOutcome, RegistryError> {
        let mut inner = self.inner.write();
        let existing = inner.index.get(descriptor.id()).copied();
        let outcome = match existing {
            None => {
                let slot = inner.order.len();
                inner.index.insert(descriptor.id().clone(), slot);
                debug!(
                    target: "registry",
                    measure = %descriptor.id(),
                    group = descriptor.group(),
                    "descriptor registered"
                );
                inner.order.push(Arc::new(descriptor));
                RegisterOutcome::Inserted
            }
            Some(slot) if inner.order[slot].is_equivalent(&descriptor) => {
                debug!(target: "registry", measure = %descriptor.id(), "equivalent descriptor already registered");
                RegisterOutcome::Unchanged
            }
            Some(slot) => match self.policy {
                DuplicatePolicy::Reject => {
                    warn!(target: "registry", measure = %descriptor.id(), "duplicate measure identifier rejected");
                    metrics::record_rejection();
                    return Err(RegistryError::DuplicateIdentifier(
                        descriptor.id().to_string(),
                    ));
                }
                DuplicatePolicy::FirstWins => {
                    info!(target: "registry", measure = %descriptor.id(), "keeping first registration");
                    RegisterOutcome::Ignored
                }
                DuplicatePolicy::LastWins => {
                    info!(target: "registry", measure = %descriptor.id(), "replacing earlier registration");
                    inner.order[slot] = Arc::new(descriptor);
                    RegisterOutcome::Replaced
                }
            },
        };
        metrics::record_registration(outcome);
        metrics::set_descriptor_count(&self.label, inner.order.len());
        Ok(outcome)
    }

    fn all(&self) -> Vec<Arc<MeasureDescriptor>> {
        self.inner.read().order.clone()
    }

    fn by_id(&self, id: &MeasureId) -> Result<Arc<MeasureDescriptor>, RegistryError> {
        let inner = self.inner.read();
        inner
            .index
            .get(id)
            .map(|slot| Arc::clone(&inner.order[*slot]))
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    fn len(&self) -> usize {
        self.inner.read().order.len()
    }
}

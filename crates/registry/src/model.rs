use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use hiermeasure_core_types::{Hierarchy, MeasureError, MeasureId, MeasureValue};
use tracing::warn;

use crate::errors::RegistryError;
use crate::fault::{panic_message, FaultKind, MeasureFault};
use crate::lazy::LazyMeasure;

/// Group assigned to descriptors that do not name one.
pub const DEFAULT_GROUP: &str = "/";

/// External measure algorithm. Implementations must tolerate concurrent
/// read-only use; any internal caching is their own concern.
pub trait MeasureImplementation: Send + Sync {
    fn compute(&self, hierarchy: &dyn Hierarchy) -> Result<MeasureValue, MeasureError>;
}

impl<F> MeasureImplementation for F
where
    F: Fn(&dyn Hierarchy) -> Result<MeasureValue, MeasureError> + Send + Sync,
{
    fn compute(&self, hierarchy: &dyn Hierarchy) -> Result<MeasureValue, MeasureError> {
        self(hierarchy)
    }
}

pub type ApplicabilityFn = Arc<dyn Fn(&dyn Hierarchy) -> bool + Send + Sync>;

/// Decides whether a descriptor is meaningful for a hierarchy. Must only look
/// at summary state and never trigger the measure itself.
#[derive(Clone, Default)]
pub enum Applicability {
    #[default]
    Always,
    /// Only hierarchies that carry ground-truth classes.
    RequiresGroundTruth,
    Custom(ApplicabilityFn),
}

impl Applicability {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&dyn Hierarchy) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    pub fn check(&self, hierarchy: &dyn Hierarchy) -> bool {
        match self {
            Applicability::Always => true,
            Applicability::RequiresGroundTruth => hierarchy.number_of_classes() > 0,
            Applicability::Custom(predicate) => predicate(hierarchy),
        }
    }
}

impl fmt::Debug for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Applicability::Always => f.write_str("Always"),
            Applicability::RequiresGroundTruth => f.write_str("RequiresGroundTruth"),
            Applicability::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Shape in which a descriptor hands its result to the host.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Projection {
    #[default]
    Raw,
    /// Render the result as text; contingency counts use their `TP/FP/TN/FN` form.
    Text,
}

impl Projection {
    pub fn apply(self, value: MeasureValue) -> MeasureValue {
        match (self, value) {
            (Projection::Raw, value) => value,
            (Projection::Text, MeasureValue::Text(text)) => MeasureValue::Text(text),
            (Projection::Text, MeasureValue::Counts(counts)) => MeasureValue::Text(counts.render()),
            (Projection::Text, other) => MeasureValue::Text(other.to_string()),
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DuplicatePolicy {
    /// Conflicting re-registration fails with `DuplicateIdentifier`.
    #[default]
    Reject,
    FirstWins,
    /// Conflicting re-registration replaces the descriptor in place.
    LastWins,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegisterOutcome {
    Inserted,
    Replaced,
    /// A conflicting registration was dropped under `FirstWins`.
    Ignored,
    /// An equivalent descriptor was already registered.
    Unchanged,
}

impl RegisterOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RegisterOutcome::Inserted => "inserted",
            RegisterOutcome::Replaced => "replaced",
            RegisterOutcome::Ignored => "ignored",
            RegisterOutcome::Unchanged => "unchanged",
        }
    }
}

/// Plugin-level binding of an identifier, applicability rule and result
/// projection to a lazily constructed measure implementation.
pub struct MeasureDescriptor {
    id: MeasureId,
    group: String,
    applicability: Applicability,
    auto_compute: bool,
    projection: Projection,
    definition: Option<String>,
    binding: LazyMeasure,
}

impl MeasureDescriptor {
    pub fn builder(id: impl Into<MeasureId>) -> DescriptorBuilder {
        DescriptorBuilder::new(id)
    }

    pub fn id(&self) -> &MeasureId {
        &self.id
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn applicability(&self) -> &Applicability {
        &self.applicability
    }

    pub fn auto_compute(&self) -> bool {
        self.auto_compute
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub fn is_constructed(&self) -> bool {
        self.binding.is_constructed()
    }

    /// Two descriptors are equivalent when both carry the same canonical definition.
    pub fn is_equivalent(&self, other: &MeasureDescriptor) -> bool {
        self.id == other.id
            && matches!(
                (&self.definition, &other.definition),
                (Some(left), Some(right)) if left == right
            )
    }

    /// Runs the applicability rule. A panicking custom predicate counts as
    /// inapplicable.
    pub fn is_applicable(&self, hierarchy: &dyn Hierarchy) -> bool {
        match catch_unwind(AssertUnwindSafe(|| self.applicability.check(hierarchy))) {
            Ok(applicable) => applicable,
            Err(payload) => {
                warn!(
                    target: "registry",
                    measure = %self.id,
                    error = %panic_message(payload.as_ref()),
                    "applicability predicate panicked; treating measure as inapplicable"
                );
                false
            }
        }
    }

    /// Computes the measure, constructing the implementation on first use.
    pub fn evaluate(&self, hierarchy: &dyn Hierarchy) -> Result<MeasureValue, MeasureFault> {
        let implementation = self
            .binding
            .get()
            .map_err(|detail| MeasureFault::new(self.id.clone(), FaultKind::Construction, detail))?;
        match catch_unwind(AssertUnwindSafe(|| implementation.compute(hierarchy))) {
            Ok(Ok(value)) => Ok(self.projection.apply(value)),
            Ok(Err(err)) => Err(MeasureFault::new(
                self.id.clone(),
                FaultKind::Evaluation,
                err.to_string(),
            )),
            Err(payload) => Err(MeasureFault::new(
                self.id.clone(),
                FaultKind::Panicked,
                panic_message(payload.as_ref()),
            )),
        }
    }
}

impl fmt::Debug for MeasureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeasureDescriptor")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("applicability", &self.applicability)
            .field("auto_compute", &self.auto_compute)
            .field("projection", &self.projection)
            .field("binding", &self.binding)
            .finish()
    }
}

pub struct DescriptorBuilder {
    id: MeasureId,
    group: String,
    applicability: Applicability,
    auto_compute: bool,
    projection: Projection,
    definition: Option<String>,
    binding: Option<LazyMeasure>,
}

impl DescriptorBuilder {
    pub fn new(id: impl Into<MeasureId>) -> Self {
        Self {
            id: id.into(),
            group: DEFAULT_GROUP.to_string(),
            applicability: Applicability::Always,
            auto_compute: false,
            projection: Projection::Raw,
            definition: None,
            binding: None,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn applicability(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }

    pub fn requires_ground_truth(self) -> Self {
        self.applicability(Applicability::RequiresGroundTruth)
    }

    pub fn auto_compute(mut self, auto_compute: bool) -> Self {
        self.auto_compute = auto_compute;
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn implementation(mut self, implementation: Arc<dyn MeasureImplementation>) -> Self {
        self.binding = Some(LazyMeasure::ready(implementation));
        self
    }

    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn MeasureImplementation>, MeasureError> + Send + Sync + 'static,
    {
        self.binding = Some(LazyMeasure::new(factory));
        self
    }

    pub fn build(self) -> Result<MeasureDescriptor, RegistryError> {
        if self.id.as_str().trim().is_empty() {
            return Err(RegistryError::configuration("", "identifier must not be empty"));
        }
        let binding = self.binding.ok_or_else(|| {
            RegistryError::configuration(self.id.as_str(), "no measure implementation bound")
        })?;
        let group = if self.group.trim().is_empty() {
            DEFAULT_GROUP.to_string()
        } else {
            self.group
        };
        Ok(MeasureDescriptor {
            id: self.id,
            group,
            applicability: self.applicability,
            auto_compute: self.auto_compute,
            projection: self.projection,
            definition: self.definition,
            binding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiermeasure_core_types::{BasicHierarchy, HypothesisCounts, Instance};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn labelled(labelled: bool) -> BasicHierarchy {
        let mut builder = BasicHierarchy::builder();
        builder.group("gen.0", None).unwrap();
        let instance = Instance::new("a", vec![0.0]);
        let instance = if labelled {
            instance.with_class("gen.0")
        } else {
            instance
        };
        builder.instance("gen.0", instance);
        builder.build().unwrap()
    }

    fn counts(_: &dyn Hierarchy) -> Result<MeasureValue, MeasureError> {
        Ok(MeasureValue::Counts(HypothesisCounts::new(1, 2, 3, 4)))
    }

    #[test]
    fn builder_applies_defaults() {
        let descriptor = MeasureDescriptor::builder("Height")
            .implementation(Arc::new(counts))
            .build()
            .unwrap();
        assert_eq!(descriptor.group(), DEFAULT_GROUP);
        assert!(!descriptor.auto_compute());
        assert_eq!(descriptor.projection(), Projection::Raw);
        assert!(descriptor.is_applicable(&labelled(false)));
    }

    #[test]
    fn builder_rejects_missing_binding() {
        let err = MeasureDescriptor::builder("Orphan").build().unwrap_err();
        assert!(matches!(err, RegistryError::Configuration { .. }));
    }

    #[test]
    fn ground_truth_gate_does_not_construct() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let descriptor = MeasureDescriptor::builder("Flat Entropy 2")
            .requires_ground_truth()
            .factory(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(counts) as Arc<dyn MeasureImplementation>)
            })
            .build()
            .unwrap();

        assert!(!descriptor.is_applicable(&labelled(false)));
        assert!(descriptor.is_applicable(&labelled(true)));
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert!(!descriptor.is_constructed());
    }

    #[test]
    fn text_projection_renders_counts() {
        let descriptor = MeasureDescriptor::builder("Partial Order Hypothesis")
            .projection(Projection::Text)
            .implementation(Arc::new(counts))
            .build()
            .unwrap();
        let value = descriptor.evaluate(&labelled(true)).unwrap();
        assert_eq!(value, MeasureValue::Text("TP: 1\nFP: 2\nTN: 3\nFN: 4".into()));
    }

    #[test]
    fn evaluation_errors_and_panics_become_faults() {
        let failing = MeasureDescriptor::builder("Empty Cluster")
            .implementation(Arc::new(|_: &dyn Hierarchy| -> Result<MeasureValue, MeasureError> {
                Err(MeasureError::new("division by zero"))
            }))
            .build()
            .unwrap();
        let fault = failing.evaluate(&labelled(true)).unwrap_err();
        assert_eq!(fault.kind, FaultKind::Evaluation);
        assert_eq!(fault.detail, "division by zero");

        let panicking = MeasureDescriptor::builder("Panicky")
            .implementation(Arc::new(|_: &dyn Hierarchy| -> Result<MeasureValue, MeasureError> {
                panic!("index out of bounds")
            }))
            .build()
            .unwrap();
        let fault = panicking.evaluate(&labelled(true)).unwrap_err();
        assert_eq!(fault.kind, FaultKind::Panicked);
        assert!(fault.detail.contains("index out of bounds"));
    }

    #[test]
    fn construction_fault_repeats_deterministically() {
        let descriptor = MeasureDescriptor::builder("Broken")
            .factory(|| Err(MeasureError::new("missing index")))
            .build()
            .unwrap();
        let first = descriptor.evaluate(&labelled(true)).unwrap_err();
        let second = descriptor.evaluate(&labelled(true)).unwrap_err();
        assert_eq!(first.kind, FaultKind::Construction);
        assert_eq!(first, second);
    }

    #[test]
    fn panicking_predicate_is_inapplicable() {
        let descriptor = MeasureDescriptor::builder("Guarded")
            .applicability(Applicability::custom(|_| panic!("bad predicate")))
            .implementation(Arc::new(counts))
            .build()
            .unwrap();
        assert!(!descriptor.is_applicable(&labelled(true)));
    }

    #[test]
    fn equivalence_requires_matching_definitions() {
        let make = |definition: &str| {
            MeasureDescriptor::builder("Flat Mutual Information")
                .definition(definition)
                .implementation(Arc::new(counts))
                .build()
                .unwrap()
        };
        assert!(make("a").is_equivalent(&make("a")));
        assert!(!make("a").is_equivalent(&make("b")));

        let anonymous = MeasureDescriptor::builder("Flat Mutual Information")
            .implementation(Arc::new(counts))
            .build()
            .unwrap();
        assert!(!anonymous.is_equivalent(&make("a")));
    }
}

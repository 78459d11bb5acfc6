use std::sync::Arc;

use hiermeasure_core_types::MeasureError;
use hiermeasure_registry::MeasureImplementation;

use crate::manifest::MeasureKind;

/// Source of measure algorithms. A library claims the kinds it can build and
/// constructs them on demand; construction may be expensive.
pub trait MeasureLibrary: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, kind: &MeasureKind) -> bool;

    fn instantiate(&self, kind: &MeasureKind) -> Result<Arc<dyn MeasureImplementation>, MeasureError>;
}

impl<L> MeasureLibrary for Arc<L>
where
    L: MeasureLibrary + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn supports(&self, kind: &MeasureKind) -> bool {
        (**self).supports(kind)
    }

    fn instantiate(&self, kind: &MeasureKind) -> Result<Arc<dyn MeasureImplementation>, MeasureError> {
        (**self).instantiate(kind)
    }
}

/// Libraries consulted in order; the first one supporting a kind builds it.
#[derive(Default)]
pub struct LibraryChain {
    libraries: Vec<Arc<dyn MeasureLibrary>>,
}

impl LibraryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, library: Arc<dyn MeasureLibrary>) -> Self {
        self.push(library);
        self
    }

    pub fn push(&mut self, library: Arc<dyn MeasureLibrary>) {
        self.libraries.push(library);
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    fn provider(&self, kind: &MeasureKind) -> Option<&Arc<dyn MeasureLibrary>> {
        self.libraries.iter().find(|library| library.supports(kind))
    }
}

impl MeasureLibrary for LibraryChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn supports(&self, kind: &MeasureKind) -> bool {
        self.provider(kind).is_some()
    }

    fn instantiate(&self, kind: &MeasureKind) -> Result<Arc<dyn MeasureImplementation>, MeasureError> {
        match self.provider(kind) {
            Some(library) => library.instantiate(kind),
            None => Err(MeasureError::new(format!(
                "no library provides '{}'",
                kind.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiermeasure_core_types::{Hierarchy, MeasureValue};

    struct Fixed {
        name: &'static str,
        value: f64,
    }

    impl MeasureLibrary for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, kind: &MeasureKind) -> bool {
            matches!(kind, MeasureKind::FlatClusterPurity | MeasureKind::Height)
        }

        fn instantiate(
            &self,
            _kind: &MeasureKind,
        ) -> Result<Arc<dyn MeasureImplementation>, MeasureError> {
            let value = self.value;
            Ok(Arc::new(move |_: &dyn Hierarchy| -> Result<MeasureValue, MeasureError> {
                Ok(MeasureValue::Scalar(value))
            }))
        }
    }

    #[test]
    fn first_supporting_library_wins() {
        let chain = LibraryChain::new()
            .with(Arc::new(Fixed { name: "a", value: 1.0 }))
            .with(Arc::new(Fixed { name: "b", value: 2.0 }));
        assert_eq!(chain.len(), 2);
        assert!(chain.supports(&MeasureKind::FlatClusterPurity));
        assert!(!chain.supports(&MeasureKind::HierarchicalClassPurity));
        assert_eq!(chain.provider(&MeasureKind::Height).map(|l| l.name()), Some("a"));
        assert!(chain
            .instantiate(&MeasureKind::HierarchicalClassPurity)
            .is_err());
    }
}

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use hiermeasure_core_types::MeasureError;
use once_cell::sync::OnceCell;

use crate::fault::panic_message;
use crate::model::MeasureImplementation;

pub type MeasureFactory =
    Box<dyn Fn() -> Result<Arc<dyn MeasureImplementation>, MeasureError> + Send + Sync>;

type Constructed = Result<Arc<dyn MeasureImplementation>, String>;

/// Descriptor-owned measure implementation, constructed at most once.
///
/// Concurrent first use blocks on the cell until the single construction
/// finishes. A failed construction is stored as well, so every later call
/// reports the same failure instead of retrying.
pub struct LazyMeasure {
    cell: OnceCell<Constructed>,
    factory: Option<MeasureFactory>,
}

impl LazyMeasure {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn MeasureImplementation>, MeasureError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// Binding around an implementation that was built up front.
    pub fn ready(implementation: Arc<dyn MeasureImplementation>) -> Self {
        Self {
            cell: OnceCell::with_value(Ok(implementation)),
            factory: None,
        }
    }

    /// True once construction has been attempted, whether it succeeded or not.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn is_constructed(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    pub fn get(&self) -> Result<&Arc<dyn MeasureImplementation>, String> {
        self.cell
            .get_or_init(|| self.construct())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn construct(&self) -> Constructed {
        let Some(factory) = self.factory.as_ref() else {
            return Err("measure binding has no factory".to_string());
        };
        match catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(Ok(implementation)) => Ok(implementation),
            Ok(Err(err)) => Err(err.to_string()),
            Err(payload) => Err(format!(
                "construction panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }
}

impl fmt::Debug for LazyMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "pending",
            Some(Ok(_)) => "constructed",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("LazyMeasure").field("state", &state).finish()
    }
}

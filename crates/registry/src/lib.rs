pub mod api;
pub mod errors;
pub mod fault;
pub mod lazy;
pub mod metrics;
pub mod model;
pub mod state;

pub use api::Registry;
pub use errors::RegistryError;
pub use fault::{FaultKind, MeasureFault};
pub use lazy::{LazyMeasure, MeasureFactory};
pub use model::{
    Applicability, DescriptorBuilder, DuplicatePolicy, MeasureDescriptor, MeasureImplementation,
    Projection, RegisterOutcome, DEFAULT_GROUP,
};
pub use state::RegistryImpl;

pub mod api;
mod batch;
pub mod error;
pub mod events;
pub mod gate;
pub mod holder;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod runtime;

pub use api::{Dispatcher, DispatcherService};
pub use error::SchedulerError;
pub use events::{measure_event_channel, MeasureEvent, MeasureEventKind, MeasureEventReceiver};
pub use holder::ResultHolder;
pub use model::{BatchOptions, BatchReport, MeasureKey, Outcome, OutcomeEntry};
pub use orchestrator::ComputeQueue;
pub use report::dump_measures;

use std::any::Any;
use std::fmt;

use hiermeasure_core_types::MeasureId;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FaultKind {
    /// The one-time construction of the measure implementation failed.
    Construction,
    /// The implementation returned an error while computing.
    Evaluation,
    /// The implementation panicked while computing.
    Panicked,
    TimedOut,
}

impl FaultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::Construction => "construction",
            FaultKind::Evaluation => "evaluation",
            FaultKind::Panicked => "panicked",
            FaultKind::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure outcome of a single descriptor evaluation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind} fault in measure '{measure}': {detail}")]
pub struct MeasureFault {
    pub measure: MeasureId,
    pub kind: FaultKind,
    pub detail: String,
}

impl MeasureFault {
    pub fn new(measure: MeasureId, kind: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            measure,
            kind,
            detail: detail.into(),
        }
    }

    pub fn timed_out(measure: MeasureId, detail: impl Into<String>) -> Self {
        Self::new(measure, FaultKind::TimedOut, detail)
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

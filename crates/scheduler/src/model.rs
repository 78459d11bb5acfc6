use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use hiermeasure_core_types::{BatchId, HierarchyId, MeasureId, MeasureValue};
use hiermeasure_registry::MeasureFault;
use tokio_util::sync::CancellationToken;

/// Per-batch execution knobs supplied by the caller.
#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Maximum number of descriptors evaluated at the same time.
    pub parallelism: usize,
    /// Budget for each individual descriptor evaluation.
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallelism: 1,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl BatchOptions {
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Computed(MeasureValue),
    /// The applicability gate rejected the hierarchy; nothing was evaluated.
    Skipped,
    Failed(MeasureFault),
    /// The batch was cancelled before this descriptor started.
    Cancelled,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Computed(_) => "computed",
            Outcome::Skipped => "skipped",
            Outcome::Failed(_) => "failed",
            Outcome::Cancelled => "cancelled",
        }
    }

    pub fn value(&self) -> Option<&MeasureValue> {
        match self {
            Outcome::Computed(value) => Some(value),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&MeasureFault> {
        match self {
            Outcome::Failed(fault) => Some(fault),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DispatchTimeline {
    pub enqueued_at: Instant,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl Default for DispatchTimeline {
    fn default() -> Self {
        Self {
            enqueued_at: Instant::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

impl DispatchTimeline {
    pub fn queued_at(enqueued_at: Instant) -> Self {
        Self {
            enqueued_at,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn mark_started(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn mark_finished(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    /// Time spent evaluating, when the descriptor actually ran.
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.checked_duration_since(start),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OutcomeEntry {
    pub measure: MeasureId,
    pub outcome: Outcome,
    pub timeline: DispatchTimeline,
}

/// Outcomes of one dispatcher run, one entry per requested descriptor, in
/// dispatch order.
#[derive(Clone, Debug)]
pub struct BatchReport {
    pub batch: BatchId,
    pub hierarchy: HierarchyId,
    entries: Vec<OutcomeEntry>,
}

impl BatchReport {
    pub fn new(hierarchy: HierarchyId, entries: Vec<OutcomeEntry>) -> Self {
        Self {
            batch: BatchId::new(),
            hierarchy,
            entries,
        }
    }

    pub fn entries(&self) -> &[OutcomeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &MeasureId) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|entry| &entry.measure == id)
            .map(|entry| &entry.outcome)
    }

    pub fn computed(&self) -> impl Iterator<Item = (&MeasureId, &MeasureValue)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.value().map(|value| (&entry.measure, value)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &MeasureFault> {
        self.entries.iter().filter_map(|entry| entry.outcome.fault())
    }

    pub fn count(&self, label: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.label() == label)
            .count()
    }

    pub fn into_map(self) -> BTreeMap<MeasureId, Outcome> {
        self.entries
            .into_iter()
            .map(|entry| (entry.measure, entry.outcome))
            .collect()
    }
}

/// Identifies one measure computed for one hierarchy.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MeasureKey {
    pub hierarchy: HierarchyId,
    pub measure: MeasureId,
}

impl MeasureKey {
    pub fn new(hierarchy: HierarchyId, measure: MeasureId) -> Self {
        Self { hierarchy, measure }
    }
}

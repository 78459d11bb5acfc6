use hiermeasure_core_types::{HierarchyId, MeasureId};
use tokio::sync::broadcast;

#[derive(Clone, Debug, PartialEq)]
pub enum MeasureEventKind {
    Posted,
    Computing,
    Computed,
    Skipped,
    Failed { detail: String },
    Cancelled,
}

/// Lifecycle notification for one measure on one hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureEvent {
    pub hierarchy: HierarchyId,
    pub measure: MeasureId,
    pub kind: MeasureEventKind,
}

impl MeasureEvent {
    pub fn new(hierarchy: HierarchyId, measure: MeasureId, kind: MeasureEventKind) -> Self {
        Self {
            hierarchy,
            measure,
            kind,
        }
    }
}

pub type MeasureEventSender = broadcast::Sender<MeasureEvent>;
pub type MeasureEventReceiver = broadcast::Receiver<MeasureEvent>;

pub fn measure_event_channel(buffer: usize) -> (MeasureEventSender, MeasureEventReceiver) {
    broadcast::channel(buffer.max(1))
}

/// Sends without caring whether anyone is listening.
pub(crate) fn emit(
    sender: &MeasureEventSender,
    hierarchy: &HierarchyId,
    measure: &MeasureId,
    kind: MeasureEventKind,
) {
    let _ = sender.send(MeasureEvent::new(hierarchy.clone(), measure.clone(), kind));
}

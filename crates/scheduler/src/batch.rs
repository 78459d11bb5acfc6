use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hiermeasure_core_types::{Hierarchy, HierarchyId, MeasureId};
use hiermeasure_registry::{FaultKind, MeasureDescriptor, MeasureFault};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::{emit, MeasureEventKind, MeasureEventSender};
use crate::gate;
use crate::metrics;
use crate::model::{BatchOptions, BatchReport, DispatchTimeline, Outcome, OutcomeEntry};

enum Slot {
    Done(OutcomeEntry),
    Running(MeasureId, JoinHandle<OutcomeEntry>),
}

/// Runs `descriptors` against `hierarchy` and reports one outcome per
/// descriptor in the given order. A descriptor listed more than once is
/// evaluated once, at its first position.
///
/// Cancellation is checked before each descriptor acquires a slot. A
/// descriptor that already started runs to completion; every descriptor not
/// yet started is reported as cancelled.
pub(crate) async fn run_batch(
    hierarchy: Arc<dyn Hierarchy>,
    descriptors: Vec<Arc<MeasureDescriptor>>,
    options: BatchOptions,
    events: MeasureEventSender,
) -> BatchReport {
    let mut seen = HashSet::new();
    let descriptors: Vec<_> = descriptors
        .into_iter()
        .filter(|descriptor| seen.insert(descriptor.id().clone()))
        .collect();
    let hierarchy_id = hierarchy.id().clone();
    let parallelism = options.parallelism.max(1);
    let slots = Arc::new(Semaphore::new(parallelism));
    let batch_started = Instant::now();
    info!(
        target: "dispatcher",
        hierarchy = %hierarchy_id,
        measures = descriptors.len(),
        parallelism,
        "dispatching measure batch"
    );

    let mut pending = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let mut timeline = DispatchTimeline::queued_at(batch_started);
        let permit = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => None,
            permit = Arc::clone(&slots).acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            metrics::record_cancelled();
            emit(&events, &hierarchy_id, descriptor.id(), MeasureEventKind::Cancelled);
            pending.push(Slot::Done(OutcomeEntry {
                measure: descriptor.id().clone(),
                outcome: Outcome::Cancelled,
                timeline,
            }));
            continue;
        };

        if !gate::admits(&descriptor, hierarchy.as_ref()) {
            drop(permit);
            metrics::record_skipped();
            emit(&events, &hierarchy_id, descriptor.id(), MeasureEventKind::Skipped);
            pending.push(Slot::Done(OutcomeEntry {
                measure: descriptor.id().clone(),
                outcome: Outcome::Skipped,
                timeline,
            }));
            continue;
        }

        metrics::record_dispatched();
        emit(&events, &hierarchy_id, descriptor.id(), MeasureEventKind::Computing);
        timeline.mark_started();
        let measure = descriptor.id().clone();
        let handle = tokio::spawn(evaluate_one(
            Arc::clone(&hierarchy),
            descriptor,
            permit,
            options.timeout,
            timeline,
            events.clone(),
        ));
        pending.push(Slot::Running(measure, handle));
    }

    let mut entries = Vec::with_capacity(pending.len());
    for slot in pending {
        match slot {
            Slot::Done(entry) => entries.push(entry),
            Slot::Running(measure, handle) => match handle.await {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(target: "dispatcher", measure = %measure, error = %err, "evaluation task aborted");
                    metrics::record_failed();
                    entries.push(OutcomeEntry {
                        measure: measure.clone(),
                        outcome: Outcome::Failed(MeasureFault::new(
                            measure,
                            FaultKind::Panicked,
                            err.to_string(),
                        )),
                        timeline: DispatchTimeline::queued_at(batch_started),
                    });
                }
            },
        }
    }

    let report = BatchReport::new(hierarchy_id, entries);
    info!(
        target: "dispatcher",
        hierarchy = %report.hierarchy,
        computed = report.count("computed"),
        skipped = report.count("skipped"),
        failed = report.count("failed"),
        cancelled = report.count("cancelled"),
        elapsed_ms = batch_started.elapsed().as_millis() as u64,
        "measure batch finished"
    );
    report
}

/// Evaluates one admitted descriptor on the blocking pool. The permit moves
/// into the blocking closure, so a timed-out computation keeps its slot
/// until it actually returns.
async fn evaluate_one(
    hierarchy: Arc<dyn Hierarchy>,
    descriptor: Arc<MeasureDescriptor>,
    permit: OwnedSemaphorePermit,
    timeout: Option<Duration>,
    mut timeline: DispatchTimeline,
    events: MeasureEventSender,
) -> OutcomeEntry {
    let measure = descriptor.id().clone();
    let hierarchy_id: HierarchyId = hierarchy.id().clone();
    let work = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        descriptor.evaluate(hierarchy.as_ref())
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => Ok(Err(MeasureFault::timed_out(
                measure.clone(),
                format!("evaluation exceeded {limit:?}"),
            ))),
        },
        None => work.await,
    };
    let result = joined.unwrap_or_else(|err| {
        Err(MeasureFault::new(
            measure.clone(),
            FaultKind::Panicked,
            err.to_string(),
        ))
    });
    timeline.mark_finished();
    let elapsed_ms = timeline
        .elapsed()
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0);

    let outcome = match result {
        Ok(value) => {
            metrics::record_computed();
            debug!(target: "dispatcher", measure = %measure, elapsed_ms, "measure computed");
            emit(&events, &hierarchy_id, &measure, MeasureEventKind::Computed);
            Outcome::Computed(value)
        }
        Err(fault) => {
            metrics::record_failed();
            warn!(
                target: "dispatcher",
                measure = %measure,
                kind = %fault.kind,
                elapsed_ms,
                "measure failed: {}",
                fault.detail
            );
            emit(
                &events,
                &hierarchy_id,
                &measure,
                MeasureEventKind::Failed {
                    detail: fault.to_string(),
                },
            );
            Outcome::Failed(fault)
        }
    };

    OutcomeEntry {
        measure,
        outcome,
        timeline,
    }
}

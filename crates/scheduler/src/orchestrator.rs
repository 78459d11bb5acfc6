use std::sync::Arc;

use hiermeasure_core_types::{Hierarchy, HierarchyId, MeasureId};
use hiermeasure_registry::{FaultKind, MeasureDescriptor, MeasureFault, Registry};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::events::{emit, MeasureEventKind, MeasureEventSender};
use crate::gate;
use crate::holder::ResultHolder;
use crate::metrics;
use crate::model::MeasureKey;
use crate::runtime::{JobQueue, QueuedJob};

/// Background worker that computes posted measures one at a time and stores
/// the values in a [`ResultHolder`].
pub struct ComputeQueue {
    queue: Arc<JobQueue>,
    holder: Arc<ResultHolder>,
    events: MeasureEventSender,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ComputeQueue {
    pub fn new(holder: Arc<ResultHolder>, events: MeasureEventSender) -> Self {
        Self {
            queue: Arc::new(JobQueue::new()),
            holder,
            events,
            worker: Mutex::new(None),
        }
    }

    pub fn holder(&self) -> &Arc<ResultHolder> {
        &self.holder
    }

    pub async fn spawn(&self) {
        let mut guard = self.worker.lock().await;
        if guard.is_some() || self.queue.is_closed() {
            return;
        }
        let queue = Arc::clone(&self.queue);
        let holder = Arc::clone(&self.holder);
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            while let Some(job) = queue.next_job().await {
                let key = job.key();
                compute_job(&holder, &events, job).await;
                queue.finish(&key);
            }
            debug!(target: "compute_queue", "compute worker stopped");
        });
        *guard = Some(handle);
    }

    /// Queues `descriptor` for `hierarchy`. Returns `Ok(false)` when the same
    /// measure is already pending for that hierarchy.
    pub async fn post(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        descriptor: Arc<MeasureDescriptor>,
    ) -> Result<bool, SchedulerError> {
        if self.queue.is_closed() {
            return Err(SchedulerError::QueueClosed);
        }
        self.spawn().await;
        let hierarchy_id = hierarchy.id().clone();
        let measure = descriptor.id().clone();
        let posted = self.queue.enqueue(QueuedJob::new(hierarchy, descriptor));
        if posted {
            debug!(target: "compute_queue", hierarchy = %hierarchy_id, measure = %measure, "measure posted");
            emit(&self.events, &hierarchy_id, &measure, MeasureEventKind::Posted);
        }
        Ok(posted)
    }

    /// Posts every auto-compute descriptor that applies to `hierarchy` and has
    /// neither been computed nor queued yet. Returns how many were posted.
    pub async fn post_auto_compute_for<R>(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        registry: &R,
    ) -> Result<usize, SchedulerError>
    where
        R: Registry + ?Sized,
    {
        let hierarchy_id = hierarchy.id().clone();
        let mut posted = 0;
        for descriptor in registry.filter(&|descriptor| descriptor.auto_compute()) {
            if self.holder.is_computed(&hierarchy_id, descriptor.id())
                || self.is_pending(&hierarchy_id, descriptor.id())
                || !gate::admits(&descriptor, hierarchy.as_ref())
            {
                continue;
            }
            if self.post(Arc::clone(&hierarchy), descriptor).await? {
                posted += 1;
            }
        }
        info!(target: "compute_queue", hierarchy = %hierarchy_id, posted, "auto-compute measures posted");
        Ok(posted)
    }

    /// Drops a queued job unless it is already being computed.
    pub fn remove(&self, hierarchy: &HierarchyId, measure: &MeasureId) -> bool {
        self.queue
            .remove(&MeasureKey::new(hierarchy.clone(), measure.clone()))
    }

    /// True while the measure is queued or being computed.
    pub fn is_pending(&self, hierarchy: &HierarchyId, measure: &MeasureId) -> bool {
        self.queue
            .is_pending(&MeasureKey::new(hierarchy.clone(), measure.clone()))
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Waits until every posted job has been computed or removed.
    pub async fn wait_idle(&self) {
        self.queue.wait_idle().await;
    }

    pub fn clear_pending(&self) -> usize {
        let cleared = self.queue.clear();
        if cleared > 0 {
            info!(target: "compute_queue", cleared, "pending measures cleared");
        }
        cleared
    }

    /// Clears the queue and waits for the job in progress, if any, to finish.
    pub async fn shutdown(&self) {
        self.queue.close();
        self.clear_pending();
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(target: "compute_queue", error = %err, "compute worker ended abnormally");
            }
        }
    }
}

async fn compute_job(holder: &Arc<ResultHolder>, events: &MeasureEventSender, job: QueuedJob) {
    let QueuedJob {
        hierarchy,
        descriptor,
        mut timeline,
    } = job;
    let hierarchy_id = hierarchy.id().clone();
    let measure = descriptor.id().clone();
    emit(events, &hierarchy_id, &measure, MeasureEventKind::Computing);
    metrics::record_dispatched();

    let result = tokio::task::spawn_blocking(move || descriptor.evaluate(hierarchy.as_ref()))
        .await
        .unwrap_or_else(|err| {
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

    match result {
        Ok(value) => {
            metrics::record_computed();
            holder.put(&hierarchy_id, &measure, value);
            debug!(target: "compute_queue", measure = %measure, elapsed_ms, "measure computed");
            emit(events, &hierarchy_id, &measure, MeasureEventKind::Computed);
        }
        Err(fault) => {
            metrics::record_failed();
            warn!(target: "compute_queue", measure = %measure, kind = %fault.kind, "measure failed: {}", fault.detail);
            emit(
                events,
                &hierarchy_id,
                &measure,
                MeasureEventKind::Failed {
                    detail: fault.to_string(),
                },
            );
        }
    }
}

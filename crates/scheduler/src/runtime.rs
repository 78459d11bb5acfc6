use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hiermeasure_core_types::Hierarchy;
use hiermeasure_registry::MeasureDescriptor;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::model::{DispatchTimeline, MeasureKey};

pub struct QueuedJob {
    pub hierarchy: Arc<dyn Hierarchy>,
    pub descriptor: Arc<MeasureDescriptor>,
    pub timeline: DispatchTimeline,
}

impl QueuedJob {
    pub fn new(hierarchy: Arc<dyn Hierarchy>, descriptor: Arc<MeasureDescriptor>) -> Self {
        Self {
            hierarchy,
            descriptor,
            timeline: DispatchTimeline::default(),
        }
    }

    pub fn key(&self) -> MeasureKey {
        MeasureKey::new(self.hierarchy.id().clone(), self.descriptor.id().clone())
    }
}

impl std::fmt::Debug for QueuedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedJob")
            .field("hierarchy", self.hierarchy.id())
            .field("measure", self.descriptor.id())
            .finish()
    }
}

/// FIFO of measure jobs consumed by a single worker.
#[derive(Debug, Default)]
pub struct JobQueue {
    pending: Mutex<VecDeque<QueuedJob>>,
    running: Mutex<Option<MeasureKey>>,
    notify: Notify,
    idle: Notify,
    closed: AtomicBool,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job. Returns false when the queue is closed or the same
    /// measure is already queued or running for that hierarchy.
    pub fn enqueue(&self, job: QueuedJob) -> bool {
        if self.is_closed() {
            return false;
        }
        let key = job.key();
        {
            let mut pending = self.pending.lock();
            if self.running.lock().as_ref() == Some(&key)
                || pending.iter().any(|queued| queued.key() == key)
            {
                return false;
            }
            pending.push_back(job);
        }
        self.notify.notify_one();
        true
    }

    /// Waits for the next job and marks it as running. Returns `None` once the
    /// queue has been closed.
    pub async fn next_job(&self) -> Option<QueuedJob> {
        loop {
            if self.is_closed() {
                return None;
            }
            {
                let mut pending = self.pending.lock();
                if let Some(mut job) = pending.pop_front() {
                    *self.running.lock() = Some(job.key());
                    job.timeline.mark_started();
                    return Some(job);
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn finish(&self, key: &MeasureKey) {
        {
            let mut running = self.running.lock();
            if running.as_ref() == Some(key) {
                *running = None;
            }
        }
        self.wake_if_idle();
    }

    /// True when nothing is queued or running.
    pub fn is_idle(&self) -> bool {
        let pending = self.pending.lock();
        pending.is_empty() && self.running.lock().is_none()
    }

    /// Waits until the queue is idle or closed.
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.idle.notified();
            if self.is_idle() || self.is_closed() {
                return;
            }
            idle.await;
        }
    }

    fn wake_if_idle(&self) {
        if self.is_idle() {
            self.idle.notify_waiters();
        }
    }

    /// Removes a queued job that has not started yet.
    pub fn remove(&self, key: &MeasureKey) -> bool {
        let mut pending = self.pending.lock();
        let before = pending.len();
        pending.retain(|job| &job.key() != key);
        pending.len() != before
    }

    pub fn is_pending(&self, key: &MeasureKey) -> bool {
        let pending = self.pending.lock();
        self.running.lock().as_ref() == Some(key) || pending.iter().any(|job| &job.key() == key)
    }

    pub fn clear(&self) -> usize {
        let mut pending = self.pending.lock();
        let cleared = pending.len();
        pending.clear();
        drop(pending);
        self.wake_if_idle();
        cleared
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
        self.idle.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

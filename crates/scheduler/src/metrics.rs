use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct Counters {
    dispatched: AtomicU64,
    computed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn record_dispatched() {
    increment(&COUNTERS.dispatched);
}

pub fn record_computed() {
    increment(&COUNTERS.computed);
}

pub fn record_skipped() {
    increment(&COUNTERS.skipped);
}

pub fn record_failed() {
    increment(&COUNTERS.failed);
}

pub fn record_cancelled() {
    increment(&COUNTERS.cancelled);
}

#[derive(Clone, Debug, Default)]
pub struct DispatcherMetricsSnapshot {
    pub dispatched: u64,
    pub computed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub cancelled: u64,
}

pub fn snapshot() -> DispatcherMetricsSnapshot {
    DispatcherMetricsSnapshot {
        dispatched: COUNTERS.dispatched.load(Ordering::Relaxed),
        computed: COUNTERS.computed.load(Ordering::Relaxed),
        skipped: COUNTERS.skipped.load(Ordering::Relaxed),
        failed: COUNTERS.failed.load(Ordering::Relaxed),
        cancelled: COUNTERS.cancelled.load(Ordering::Relaxed),
    }
}

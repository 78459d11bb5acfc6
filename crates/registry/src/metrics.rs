use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounterVec, IntGaugeVec, Registry};
use tracing::error;

use crate::model::RegisterOutcome;

lazy_static! {
    static ref REGISTRY_DESCRIPTORS_TOTAL: IntGaugeVec = IntGaugeVec::new(
        opts!(
            "hiermeasure_registry_descriptors_total",
            "Measure descriptors held by each live registry"
        ),
        &["registry"]
    )
    .unwrap();
    static ref REGISTRY_REGISTRATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "hiermeasure_registry_registrations_total",
            "Registration attempts grouped by result"
        ),
        &["result"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register registry metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, REGISTRY_DESCRIPTORS_TOTAL.clone());
    register(registry, REGISTRY_REGISTRATIONS_TOTAL.clone());
}

pub fn set_descriptor_count(registry: &str, count: usize) {
    REGISTRY_DESCRIPTORS_TOTAL
        .with_label_values(&[registry])
        .set(count as i64);
}

pub fn descriptor_count(registry: &str) -> Option<i64> {
    let families = REGISTRY_DESCRIPTORS_TOTAL.collect();
    families
        .iter()
        .flat_map(|family| family.get_metric())
        .find(|metric| {
            metric
                .get_label()
                .iter()
                .any(|pair| pair.get_name() == "registry" && pair.get_value() == registry)
        })
        .map(|metric| metric.get_gauge().get_value() as i64)
}

pub fn forget_registry(registry: &str) {
    let _ = REGISTRY_DESCRIPTORS_TOTAL.remove_label_values(&[registry]);
}

pub fn record_registration(outcome: RegisterOutcome) {
    REGISTRY_REGISTRATIONS_TOTAL
        .with_label_values(&[outcome.as_str()])
        .inc();
}

pub fn record_rejection() {
    REGISTRY_REGISTRATIONS_TOTAL
        .with_label_values(&["rejected"])
        .inc();
}

use once_cell::sync::{Lazy, OnceCell};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::error;

use hiermeasure_registry::metrics as registry_metrics;
use hiermeasure_scheduler::metrics as scheduler_metrics;

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        registry_metrics::register_metrics(global_registry());
    });
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

/// Prometheus text exposition of the registry gauges followed by the
/// dispatcher counters.
pub fn render_metrics() -> String {
    register_metrics();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&global_registry().gather(), &mut buffer) {
        error!(?err, "failed to encode prometheus metrics");
    }
    let mut body = String::from_utf8_lossy(&buffer).into_owned();

    let counters = scheduler_metrics::snapshot();
    for (name, value) in [
        ("dispatched", counters.dispatched),
        ("computed", counters.computed),
        ("skipped", counters.skipped),
        ("failed", counters.failed),
        ("cancelled", counters.cancelled),
    ] {
        body.push_str(&format!("hiermeasure_dispatcher_{}_total {}\n", name, value));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HostConfig, MeasureHost, Selection};
    use hiermeasure_core_types::{BasicHierarchy, Hierarchy};
    use serial_test::serial;
    use std::sync::Arc;

    #[test]
    fn renders_registry_and_dispatcher_metrics() {
        let host = MeasureHost::from_config(&HostConfig::default(), None).unwrap();
        let body = render_metrics();
        let gauge = format!(
            "hiermeasure_registry_descriptors_total{{registry=\"{}\"}} 9",
            host.registry().metrics_label()
        );
        assert!(body.contains(&gauge), "{body}");
        assert!(body.contains("hiermeasure_dispatcher_computed_total"));
    }

    #[tokio::test]
    #[serial]
    async fn evaluation_moves_dispatcher_counters() {
        let mut builder = BasicHierarchy::builder();
        builder.group("gen.0", None).unwrap();
        let hierarchy: Arc<dyn Hierarchy> = Arc::new(builder.build().unwrap());

        let host = MeasureHost::from_config(&HostConfig::default(), None).unwrap();
        let before = scheduler_metrics::snapshot();
        host.evaluate(hierarchy, &Selection::All, host.batch_options())
            .await
            .unwrap();
        let after = scheduler_metrics::snapshot();
        assert_eq!(after.computed - before.computed, 9);
        assert_eq!(after.dispatched - before.dispatched, 9);
        host.shutdown().await;
    }
}

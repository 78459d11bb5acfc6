//! Measure host
//!
//! Owns the registry, dispatcher and background compute queue for one
//! process. Created explicitly from a [`HostConfig`] and torn down with
//! [`MeasureHost::shutdown`].

use std::sync::Arc;

use hiermeasure_catalog::{
    install_builtin, install_loaded, load_manifest_path, InstallReport, LibraryChain,
    MeasureLibrary, StructuralLibrary,
};
use hiermeasure_core_types::{Hierarchy, MeasureId};
use hiermeasure_registry::{Registry, RegistryImpl};
use hiermeasure_scheduler::{
    measure_event_channel, BatchOptions, BatchReport, ComputeQueue, Dispatcher, DispatcherService,
    MeasureEventReceiver, Outcome, ResultHolder,
};
use tracing::{info, warn};

use crate::config::HostConfig;
use crate::errors::HostError;

const EVENT_BUFFER: usize = 256;

/// Which registered measures an evaluation covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    All,
    AutoCompute,
    Ids(Vec<MeasureId>),
}

pub struct MeasureHost {
    registry: Arc<RegistryImpl>,
    dispatcher: DispatcherService<RegistryImpl>,
    queue: ComputeQueue,
    install_report: InstallReport,
    defaults: BatchOptions,
}

impl MeasureHost {
    /// Builds the registry from the built-in set and the configured manifest
    /// paths. `extra_library` is consulted before the native statistics.
    pub fn from_config(
        config: &HostConfig,
        extra_library: Option<Arc<dyn MeasureLibrary>>,
    ) -> Result<Self, HostError> {
        config.validate()?;
        let registry = Arc::new(RegistryImpl::with_policy(config.duplicate_policy));

        let mut chain = LibraryChain::new();
        if let Some(extra) = extra_library {
            chain.push(extra);
        }
        chain.push(Arc::new(StructuralLibrary::new()));
        let library = Arc::new(chain);

        let mut report = InstallReport::default();
        if config.include_builtin {
            report.merge(install_builtin(registry.as_ref(), Arc::clone(&library)));
        }
        for path in &config.catalog_paths {
            match load_manifest_path(path) {
                Ok(loaded) => {
                    report.merge(install_loaded(registry.as_ref(), loaded, Arc::clone(&library)))
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "measure catalog skipped");
                    report.rejected.push((path.display().to_string(), err));
                }
            }
        }
        info!(
            measures = registry.len(),
            rejected = report.rejected.len(),
            "measure host ready"
        );

        let defaults = config.batch_options()?;
        let (events, _) = measure_event_channel(EVENT_BUFFER);
        let dispatcher = DispatcherService::with_events(Arc::clone(&registry), events.clone())
            .with_timeout(defaults.timeout);
        let queue = ComputeQueue::new(Arc::new(ResultHolder::new()), events);

        Ok(Self {
            registry,
            dispatcher,
            queue,
            install_report: report,
            defaults,
        })
    }

    pub fn registry(&self) -> &Arc<RegistryImpl> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &DispatcherService<RegistryImpl> {
        &self.dispatcher
    }

    pub fn queue(&self) -> &ComputeQueue {
        &self.queue
    }

    pub fn holder(&self) -> &Arc<ResultHolder> {
        self.queue.holder()
    }

    pub fn install_report(&self) -> &InstallReport {
        &self.install_report
    }

    pub fn subscribe(&self) -> MeasureEventReceiver {
        self.dispatcher.subscribe()
    }

    /// Batch options from the configuration, with a fresh cancellation token.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            cancel: Default::default(),
            ..self.defaults.clone()
        }
    }

    /// Runs the selected measures and keeps every computed value in the
    /// result holder.
    pub async fn evaluate(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        selection: &Selection,
        options: BatchOptions,
    ) -> Result<BatchReport, HostError> {
        let report = match selection {
            Selection::All => self.dispatcher.run_registry(hierarchy, options).await,
            Selection::AutoCompute => self.dispatcher.run_auto_compute(hierarchy, options).await,
            Selection::Ids(ids) => self.dispatcher.run_selected(hierarchy, ids, options).await?,
        };
        let holder = self.holder();
        for entry in report.entries() {
            if let Outcome::Computed(value) = &entry.outcome {
                holder.put(&report.hierarchy, &entry.measure, value.clone());
            }
        }
        Ok(report)
    }

    /// Posts the applicable auto-compute measures that have no stored value
    /// for `hierarchy` to the background queue and waits for them. Returns
    /// how many were posted.
    pub async fn precompute(&self, hierarchy: Arc<dyn Hierarchy>) -> Result<usize, HostError> {
        let posted = self
            .queue
            .post_auto_compute_for(hierarchy, self.registry.as_ref())
            .await?;
        self.queue.wait_idle().await;
        Ok(posted)
    }

    /// Stops the compute queue; pending jobs are dropped.
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
        info!("measure host stopped");
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hiermeasure_core_types::{Hierarchy, MeasureId};
use hiermeasure_registry::{MeasureDescriptor, Registry};
use tracing::debug;

use crate::batch::run_batch;
use crate::error::SchedulerError;
use crate::events::{measure_event_channel, MeasureEventReceiver, MeasureEventSender};
use crate::model::{BatchOptions, BatchReport, Outcome};

#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Evaluates the given descriptors, in order, with per-descriptor fault
    /// isolation.
    async fn run_all(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        descriptors: Vec<Arc<MeasureDescriptor>>,
        options: BatchOptions,
    ) -> BatchReport;

    /// Evaluates only the auto-compute descriptors of the registry.
    async fn run_auto_compute(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        options: BatchOptions,
    ) -> BatchReport;

    async fn run_one(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        id: &MeasureId,
    ) -> Result<Outcome, SchedulerError>;
}

pub struct DispatcherService<R>
where
    R: Registry + Send + Sync + 'static,
{
    registry: Arc<R>,
    events: MeasureEventSender,
    timeout: Option<Duration>,
}

impl<R> DispatcherService<R>
where
    R: Registry + Send + Sync + 'static,
{
    pub fn new(registry: Arc<R>) -> Self {
        let (events, _) = measure_event_channel(256);
        Self::with_events(registry, events)
    }

    pub fn with_events(registry: Arc<R>, events: MeasureEventSender) -> Self {
        Self {
            registry,
            events,
            timeout: None,
        }
    }

    /// Timeout applied by `run_one`, which takes no batch options.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub fn events(&self) -> MeasureEventSender {
        self.events.clone()
    }

    pub fn subscribe(&self) -> MeasureEventReceiver {
        self.events.subscribe()
    }

    /// Evaluates every registered descriptor in registry order.
    pub async fn run_registry(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        options: BatchOptions,
    ) -> BatchReport {
        self.run_all(hierarchy, self.registry.all(), options).await
    }

    /// Resolves `ids` against the registry and evaluates them in the given
    /// order. An unknown id fails the whole request before anything runs.
    pub async fn run_selected(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        ids: &[MeasureId],
        options: BatchOptions,
    ) -> Result<BatchReport, SchedulerError> {
        let descriptors = ids
            .iter()
            .map(|id| self.registry.by_id(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.run_all(hierarchy, descriptors, options).await)
    }
}

#[async_trait]
impl<R> Dispatcher for DispatcherService<R>
where
    R: Registry + Send + Sync + 'static,
{
    async fn run_all(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        descriptors: Vec<Arc<MeasureDescriptor>>,
        options: BatchOptions,
    ) -> BatchReport {
        run_batch(hierarchy, descriptors, options, self.events.clone()).await
    }

    async fn run_auto_compute(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        options: BatchOptions,
    ) -> BatchReport {
        let descriptors = self
            .registry
            .filter(&|descriptor| descriptor.auto_compute());
        debug!(
            target: "dispatcher",
            hierarchy = %hierarchy.id(),
            measures = descriptors.len(),
            "selected auto-compute measures"
        );
        self.run_all(hierarchy, descriptors, options).await
    }

    async fn run_one(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        id: &MeasureId,
    ) -> Result<Outcome, SchedulerError> {
        let descriptor = self.registry.by_id(id)?;
        let mut options = BatchOptions::default();
        options.timeout = self.timeout;
        let report = self.run_all(hierarchy, vec![descriptor], options).await;
        report
            .into_map()
            .remove(id)
            .ok_or_else(|| SchedulerError::Join(format!("no outcome recorded for {id}")))
    }
}

#[async_trait]
impl<D> Dispatcher for Arc<D>
where
    D: Dispatcher + ?Sized,
{
    async fn run_all(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        descriptors: Vec<Arc<MeasureDescriptor>>,
        options: BatchOptions,
    ) -> BatchReport {
        (**self).run_all(hierarchy, descriptors, options).await
    }

    async fn run_auto_compute(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        options: BatchOptions,
    ) -> BatchReport {
        (**self).run_auto_compute(hierarchy, options).await
    }

    async fn run_one(
        &self,
        hierarchy: Arc<dyn Hierarchy>,
        id: &MeasureId,
    ) -> Result<Outcome, SchedulerError> {
        (**self).run_one(hierarchy, id).await
    }
}

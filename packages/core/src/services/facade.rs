//! Wiring of all services around one shared context

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::db::{DomainEvent, TekstStore};
use crate::services::{
    ContentService, CoverageService, MaintenanceProcessor, MaintenanceService, ResourceService,
    ServiceContext,
};

/// All Tekst services sharing one store, configuration, clock and event
/// channel
///
/// # Examples
///
/// ```rust
/// use tekst_core::db::InMemoryStore;
/// use tekst_core::{CoreConfig, TekstCore};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let core = TekstCore::new(Arc::new(InMemoryStore::new()), CoreConfig::default());
/// let summary = core.maintenance.run().await?;
/// assert_eq!(summary.recomputed, 0);
/// # Ok::<(), tekst_core::ServiceError>(())
/// # }).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TekstCore {
    pub resources: ResourceService,
    pub contents: ContentService,
    pub coverage: CoverageService,
    pub maintenance: MaintenanceService,
    ctx: ServiceContext,
}

impl TekstCore {
    pub fn new(store: Arc<dyn TekstStore>, config: CoreConfig) -> Self {
        Self::from_context(ServiceContext::new(store, config))
    }

    pub fn with_clock(store: Arc<dyn TekstStore>, config: CoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_context(ServiceContext::with_clock(store, config, clock))
    }

    pub fn from_context(ctx: ServiceContext) -> Self {
        let coverage = CoverageService::new(ctx.clone());
        Self {
            resources: ResourceService::new(ctx.clone()),
            contents: ContentService::new(ctx.clone(), coverage.clone()),
            maintenance: MaintenanceService::new(ctx.clone(), coverage.clone()),
            coverage,
            ctx,
        }
    }

    /// Start background maintenance, woken after every content change
    ///
    /// Must be called from within a tokio runtime. The processor stops when
    /// the returned handle is dropped.
    pub fn spawn_maintenance(&mut self) -> MaintenanceProcessor {
        let processor = MaintenanceProcessor::spawn(self.maintenance.clone());
        self.contents = self.contents.clone().with_maintenance_waker(processor.waker());
        processor
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.ctx.subscribe_to_events()
    }
}

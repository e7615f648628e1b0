//! Shared service context
//!
//! Every service holds a clone of [`ServiceContext`]: the storage
//! collaborator, the resource type registry, configuration, the time source
//! and the domain event channel. All fields are cheap `Arc` clones.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::access::AccessContext;
use crate::behaviors::ResourceTypeRegistry;
use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::db::{DomainEvent, TekstStore};
use crate::models::Resource;
use crate::services::ServiceError;

/// Broadcast channel capacity for domain events
const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;

#[derive(Clone)]
pub struct ServiceContext {
    pub(crate) store: Arc<dyn TekstStore>,
    pub(crate) registry: Arc<ResourceTypeRegistry>,
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) clock: Arc<dyn Clock>,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl ServiceContext {
    /// Context with the built-in resource types and the system clock
    pub fn new(store: Arc<dyn TekstStore>, config: CoreConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn TekstStore>, config: CoreConfig, clock: Arc<dyn Clock>) -> Self {
        let registry = ResourceTypeRegistry::with_builtin_types(&config);
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            registry: Arc::new(registry),
            config: Arc::new(config),
            clock,
            event_tx,
        }
    }

    pub fn store(&self) -> &Arc<dyn TekstStore> {
        &self.store
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &ResourceTypeRegistry {
        &self.registry
    }

    /// Subscribe to domain events emitted by any service sharing this context
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    /// Emit a domain event to all subscribers
    ///
    /// Ignores errors if there are no subscribers.
    pub(crate) fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Per-request access context from the current set of active texts
    pub(crate) async fn access_context(&self) -> Result<AccessContext, ServiceError> {
        Ok(AccessContext {
            active_text_ids: self.store.get_active_text_ids().await?,
        })
    }

    /// Fetch a resource or fail with `NotFound`
    pub(crate) async fn require_resource(&self, id: &str) -> Result<Resource, ServiceError> {
        self.store
            .get_resource(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("resource", id))
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

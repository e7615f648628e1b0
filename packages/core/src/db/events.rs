//! Domain Events
//!
//! Events emitted by the services when data changes. They follow the observer
//! pattern so search indexers or UI layers can react to changes without
//! coupling to the service implementations.
//!
//! # Architecture
//!
//! Events are sent over a tokio broadcast channel, allowing multiple
//! subscribers to receive notifications asynchronously. Sending never fails
//! the originating operation; events without subscribers are dropped.

use crate::models::Resource;
use serde::{Deserialize, Serialize};

/// Domain events emitted by the Tekst services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum DomainEvent {
    ResourceCreated(Box<Resource>),

    /// Resource metadata, shares, ownership or publication status changed
    ResourceUpdated(Box<Resource>),

    #[serde(rename_all = "camelCase")]
    ResourceDeleted { id: String },

    /// A content was created, updated or deleted
    #[serde(rename_all = "camelCase")]
    ContentChanged {
        resource_id: String,
        location_id: String,
    },

    /// A precomputed coverage artifact was (re)written
    #[serde(rename_all = "camelCase")]
    CoverageReplaced { ref_id: String },
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::ResourceCreated(_) => "resource:created",
            DomainEvent::ResourceUpdated(_) => "resource:updated",
            DomainEvent::ResourceDeleted { .. } => "resource:deleted",
            DomainEvent::ContentChanged { .. } => "content:changed",
            DomainEvent::CoverageReplaced { .. } => "coverage:replaced",
        }
    }
}

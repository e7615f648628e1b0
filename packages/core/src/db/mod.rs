//! Database Layer
//!
//! This module defines how the services reach persistence:
//!
//! - [`TekstStore`] trait abstracting texts, locations, resources, contents
//!   and precomputed artifacts
//! - [`InMemoryStore`] implementation for tests and embedders
//! - [`DomainEvent`]s emitted on data changes
//!
//! # Architecture
//!
//! Storage is an external collaborator. Services hold an
//! `Arc<dyn TekstStore>` and never depend on a concrete backend.

mod error;
pub mod events;
mod memory_store;
mod store;

pub use error::DatabaseError;
pub use events::DomainEvent;
pub use memory_store::InMemoryStore;
pub use store::{StoreResult, TekstStore};

//! TekstStore Trait - Storage Abstraction Layer
//!
//! This module defines the `TekstStore` trait that abstracts persistence of
//! texts, locations, resources, contents and precomputed artifacts. Services
//! only talk to storage through this trait.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every method is async; these are the only suspension
//!    points of the services
//! 2. **Ownership Semantics**: writes take ownership of the record and return
//!    the stored version
//! 3. **Missing Is Not An Error**: lookups return `Ok(None)`; only failed
//!    operations produce a [`DatabaseError`]
//! 4. **Ordering**: location queries return locations in ascending position
//!
//! # Examples
//!
//! ```rust
//! use tekst_core::db::{InMemoryStore, TekstStore};
//! use tekst_core::models::{Location, Text};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store: Arc<dyn TekstStore> = Arc::new(InMemoryStore::new());
//! let text = Text::new("Rigveda");
//! let text_id = text.id.clone();
//! store.create_text(text).await?;
//! store.create_location(Location::new(&text_id, 0, 0, None, "1")).await?;
//!
//! let locations = store.find_locations(&text_id, 0).await?;
//! assert_eq!(locations.len(), 1);
//! # Ok::<(), tekst_core::db::DatabaseError>(())
//! # }).unwrap();
//! ```

use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};

use super::DatabaseError;
use crate::access::Predicate;
use crate::models::{
    Content, Location, PrecomputedData, PrecomputedKind, Resource, Text, User,
};

pub type StoreResult<T> = Result<T, DatabaseError>;

/// Abstraction layer for Tekst persistence operations
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so stores can be shared as
/// `Arc<dyn TekstStore>` across tasks.
#[async_trait]
pub trait TekstStore: Send + Sync {
    //
    // TEXTS & USERS
    //

    async fn create_text(&self, text: Text) -> StoreResult<Text>;

    async fn get_text(&self, id: &str) -> StoreResult<Option<Text>>;

    /// IDs of all texts currently enabled platform-wide
    async fn get_active_text_ids(&self) -> StoreResult<BTreeSet<String>>;

    async fn create_user(&self, user: User) -> StoreResult<User>;

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;

    //
    // LOCATIONS
    //

    async fn create_location(&self, location: Location) -> StoreResult<Location>;

    async fn get_location(&self, id: &str) -> StoreResult<Option<Location>>;

    /// All locations of a text on one level, ordered by ascending position
    async fn find_locations(&self, text_id: &str, level: u32) -> StoreResult<Vec<Location>>;

    /// All locations of a text on levels `0..=max_level`
    ///
    /// Used to compute full location labels. The default implementation
    /// queries level by level.
    async fn find_locations_up_to(&self, text_id: &str, max_level: u32) -> StoreResult<Vec<Location>> {
        let mut all = Vec::new();
        for level in 0..=max_level {
            all.extend(self.find_locations(text_id, level).await?);
        }
        Ok(all)
    }

    //
    // RESOURCES
    //

    async fn create_resource(&self, resource: Resource) -> StoreResult<Resource>;

    async fn get_resource(&self, id: &str) -> StoreResult<Option<Resource>>;

    /// Resources matching a filter
    async fn find_resources(&self, filter: &Predicate) -> StoreResult<Vec<Resource>>;

    /// Replace a stored resource; fails with `NotFound` if it doesn't exist
    async fn replace_resource(&self, resource: Resource) -> StoreResult<Resource>;

    /// Delete a resource together with its contents and precomputed artifacts
    ///
    /// Returns whether the resource existed.
    async fn delete_resource(&self, id: &str) -> StoreResult<bool>;

    //
    // CONTENTS
    //

    /// Create a content; fails with `Conflict` if the resource already has
    /// content at that location
    async fn create_content(&self, content: Content) -> StoreResult<Content>;

    async fn get_content(&self, id: &str) -> StoreResult<Option<Content>>;

    async fn replace_content(&self, content: Content) -> StoreResult<Content>;

    async fn delete_content(&self, id: &str) -> StoreResult<bool>;

    /// All contents of a resource
    async fn find_contents(&self, resource_id: &str) -> StoreResult<Vec<Content>>;

    /// IDs of the locations the resource has content for (bulk existence check)
    async fn find_covered_location_ids(&self, resource_id: &str) -> StoreResult<HashSet<String>>;

    /// Whether the resource has content at a location
    async fn content_exists(&self, resource_id: &str, location_id: &str) -> StoreResult<bool> {
        Ok(self
            .find_covered_location_ids(resource_id)
            .await?
            .contains(location_id))
    }

    //
    // PRECOMPUTED ARTIFACTS
    //

    async fn get_artifact(
        &self,
        ref_id: &str,
        kind: PrecomputedKind,
    ) -> StoreResult<Option<PrecomputedData>>;

    /// Atomically replace (or insert) the artifact for `(ref_id, kind)`
    async fn replace_artifact(&self, artifact: PrecomputedData) -> StoreResult<PrecomputedData>;
}

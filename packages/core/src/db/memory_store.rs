//! In-memory `TekstStore`
//!
//! Keeps all records in hash maps behind a tokio `RwLock`. Used by tests,
//! benches and embedders that bring their own persistence. Failure injection
//! (`set_unavailable`) and artificial latency (`set_latency`) let callers
//! exercise storage error and timeout paths.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use super::store::{StoreResult, TekstStore};
use super::DatabaseError;
use crate::access::Predicate;
use crate::models::{
    Content, Location, PrecomputedData, PrecomputedKind, Resource, Text, User,
};

#[derive(Debug, Default)]
struct State {
    texts: HashMap<String, Text>,
    users: HashMap<String, User>,
    locations: HashMap<String, Location>,
    resources: HashMap<String, Resource>,
    contents: HashMap<String, Content>,
    artifacts: HashMap<(String, PrecomputedKind), PrecomputedData>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
    artifact_writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent operation by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of successful `replace_artifact` calls
    pub fn artifact_write_count(&self) -> usize {
        self.artifact_writes.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> StoreResult<()> {
        let latency_ms = self.latency_ms.load(Ordering::SeqCst);
        if latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DatabaseError::unavailable("in-memory store switched off"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TekstStore for InMemoryStore {
    async fn create_text(&self, text: Text) -> StoreResult<Text> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if state.texts.contains_key(&text.id) {
            return Err(DatabaseError::conflict(format!("text {} exists", text.id)));
        }
        state.texts.insert(text.id.clone(), text.clone());
        Ok(text)
    }

    async fn get_text(&self, id: &str) -> StoreResult<Option<Text>> {
        self.enter().await?;
        Ok(self.state.read().await.texts.get(id).cloned())
    }

    async fn get_active_text_ids(&self) -> StoreResult<BTreeSet<String>> {
        self.enter().await?;
        Ok(self
            .state
            .read()
            .await
            .texts
            .values()
            .filter(|t| t.is_active)
            .map(|t| t.id.clone())
            .collect())
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.id) {
            return Err(DatabaseError::conflict(format!("user {} exists", user.id)));
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.enter().await?;
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn create_location(&self, location: Location) -> StoreResult<Location> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if !state.texts.contains_key(&location.text_id) {
            return Err(DatabaseError::not_found("text", &location.text_id));
        }
        state.locations.insert(location.id.clone(), location.clone());
        Ok(location)
    }

    async fn get_location(&self, id: &str) -> StoreResult<Option<Location>> {
        self.enter().await?;
        Ok(self.state.read().await.locations.get(id).cloned())
    }

    async fn find_locations(&self, text_id: &str, level: u32) -> StoreResult<Vec<Location>> {
        self.enter().await?;
        let state = self.state.read().await;
        let mut locations: Vec<Location> = state
            .locations
            .values()
            .filter(|l| l.text_id == text_id && l.level == level)
            .cloned()
            .collect();
        locations.sort_by_key(|l| l.position);
        Ok(locations)
    }

    async fn find_locations_up_to(&self, text_id: &str, max_level: u32) -> StoreResult<Vec<Location>> {
        self.enter().await?;
        let state = self.state.read().await;
        let mut locations: Vec<Location> = state
            .locations
            .values()
            .filter(|l| l.text_id == text_id && l.level <= max_level)
            .cloned()
            .collect();
        locations.sort_by_key(|l| (l.level, l.position));
        Ok(locations)
    }

    async fn create_resource(&self, resource: Resource) -> StoreResult<Resource> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if state.resources.contains_key(&resource.id) {
            return Err(DatabaseError::conflict(format!(
                "resource {} exists",
                resource.id
            )));
        }
        state.resources.insert(resource.id.clone(), resource.clone());
        Ok(resource)
    }

    async fn get_resource(&self, id: &str) -> StoreResult<Option<Resource>> {
        self.enter().await?;
        Ok(self.state.read().await.resources.get(id).cloned())
    }

    async fn find_resources(&self, filter: &Predicate) -> StoreResult<Vec<Resource>> {
        self.enter().await?;
        if filter.is_unsatisfiable() {
            return Ok(Vec::new());
        }
        let state = self.state.read().await;
        let mut resources: Vec<Resource> = state
            .resources
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        resources.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(resources)
    }

    async fn replace_resource(&self, resource: Resource) -> StoreResult<Resource> {
        self.enter().await?;
        let mut state = self.state.write().await;
        match state.resources.get_mut(&resource.id) {
            Some(stored) => {
                *stored = resource.clone();
                Ok(resource)
            }
            None => Err(DatabaseError::not_found("resource", &resource.id)),
        }
    }

    async fn delete_resource(&self, id: &str) -> StoreResult<bool> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if state.resources.remove(id).is_none() {
            return Ok(false);
        }
        state.contents.retain(|_, c| c.resource_id != id);
        state.artifacts.retain(|(ref_id, _), _| ref_id != id);
        Ok(true)
    }

    async fn create_content(&self, content: Content) -> StoreResult<Content> {
        self.enter().await?;
        let mut state = self.state.write().await;
        let duplicate = state.contents.values().any(|c| {
            c.resource_id == content.resource_id && c.location_id == content.location_id
        });
        if duplicate {
            return Err(DatabaseError::conflict(format!(
                "resource {} already has content at location {}",
                content.resource_id, content.location_id
            )));
        }
        state.contents.insert(content.id.clone(), content.clone());
        Ok(content)
    }

    async fn get_content(&self, id: &str) -> StoreResult<Option<Content>> {
        self.enter().await?;
        Ok(self.state.read().await.contents.get(id).cloned())
    }

    async fn replace_content(&self, content: Content) -> StoreResult<Content> {
        self.enter().await?;
        let mut state = self.state.write().await;
        match state.contents.get_mut(&content.id) {
            Some(stored) => {
                *stored = content.clone();
                Ok(content)
            }
            None => Err(DatabaseError::not_found("content", &content.id)),
        }
    }

    async fn delete_content(&self, id: &str) -> StoreResult<bool> {
        self.enter().await?;
        Ok(self.state.write().await.contents.remove(id).is_some())
    }

    async fn find_contents(&self, resource_id: &str) -> StoreResult<Vec<Content>> {
        self.enter().await?;
        let state = self.state.read().await;
        let mut contents: Vec<Content> = state
            .contents
            .values()
            .filter(|c| c.resource_id == resource_id)
            .cloned()
            .collect();
        // Order by location position so exports follow the text
        contents.sort_by_key(|c| {
            state
                .locations
                .get(&c.location_id)
                .map(|l| (l.level, l.position))
        });
        Ok(contents)
    }

    async fn find_covered_location_ids(&self, resource_id: &str) -> StoreResult<HashSet<String>> {
        self.enter().await?;
        Ok(self
            .state
            .read()
            .await
            .contents
            .values()
            .filter(|c| c.resource_id == resource_id)
            .map(|c| c.location_id.clone())
            .collect())
    }

    async fn get_artifact(
        &self,
        ref_id: &str,
        kind: PrecomputedKind,
    ) -> StoreResult<Option<PrecomputedData>> {
        self.enter().await?;
        Ok(self
            .state
            .read()
            .await
            .artifacts
            .get(&(ref_id.to_string(), kind))
            .cloned())
    }

    async fn replace_artifact(&self, artifact: PrecomputedData) -> StoreResult<PrecomputedData> {
        self.enter().await?;
        let mut state = self.state.write().await;
        state
            .artifacts
            .insert((artifact.ref_id.clone(), artifact.kind), artifact.clone());
        self.artifact_writes.fetch_add(1, Ordering::SeqCst);
        Ok(artifact)
    }
}

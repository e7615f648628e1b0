//! Shared fixtures for service unit tests

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use crate::clock::ManualClock;
use crate::config::CoreConfig;
use crate::db::{InMemoryStore, TekstStore};
use crate::models::{Content, ContentPayload, Location, Resource, ResourceType, Text, User};
use crate::services::ServiceContext;

/// A text with two books of three hymns each and three users
pub(crate) struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub ctx: ServiceContext,
    pub text: Text,
    pub books: Vec<Location>,
    pub hymns: Vec<Location>,
    pub owner: User,
    pub other: User,
    pub admin: User,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(CoreConfig::default()).await
    }

    pub async fn with_config(config: CoreConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));

        let text = store.create_text(Text::new("Rigveda").with_levels(["Book", "Hymn"])).await.unwrap();
        let mut books = Vec::new();
        let mut hymns = Vec::new();
        for book_no in 0..2i64 {
            let book = Location::new(&text.id, 0, book_no, None, (book_no + 1).to_string());
            let book = store.create_location(book).await.unwrap();
            for hymn_no in 0..3i64 {
                let hymn = Location::new(
                    &text.id,
                    1,
                    book_no * 3 + hymn_no,
                    Some(book.id.clone()),
                    (hymn_no + 1).to_string(),
                );
                hymns.push(store.create_location(hymn).await.unwrap());
            }
            books.push(book);
        }

        let owner = store.create_user(User::new()).await.unwrap();
        let other = store.create_user(User::new()).await.unwrap();
        let admin = store.create_user(User::superuser()).await.unwrap();

        let ctx = ServiceContext::with_clock(store.clone(), config, clock.clone());
        Self {
            store,
            clock,
            ctx,
            text,
            books,
            hymns,
            owner,
            other,
            admin,
        }
    }

    /// A private resource owned by `owner`, stored
    pub async fn resource(&self, resource_type: ResourceType, level: u32) -> Resource {
        let resource = Resource::new(
            resource_type,
            "Translation".to_string(),
            self.text.id.clone(),
            level,
            Some(self.owner.id.clone()),
        );
        self.store.create_resource(resource).await.unwrap()
    }

    /// Store plain text content at `location`, bypassing the services
    ///
    /// Marks the resource as changed now and moves the clock forward, so a
    /// later computation produces a strictly newer artifact.
    pub async fn cover(&self, resource: &mut Resource, location: &Location) {
        let content = Content::new(
            &resource.id,
            &location.id,
            ContentPayload::PlainText {
                text: format!("content at {}", location.label),
            },
        );
        self.store.create_content(content).await.unwrap();
        self.touch(resource).await;
    }

    /// Mark the resource's contents as changed now and advance the clock
    pub async fn touch(&self, resource: &mut Resource) {
        use crate::clock::Clock;
        resource.contents_changed_at = self.clock.now();
        *resource = self.store.replace_resource(resource.clone()).await.unwrap();
        self.clock.advance(chrono::Duration::seconds(1));
    }
}

//! Content Service - Content Mutations and Change Hook
//!
//! Contents are created, updated and deleted on behalf of users with write
//! access to their resource. Every mutation runs the change hook:
//!
//! 1. `contents_changed_at` of the resource is set to now
//! 2. the resource type's `contents_changed` hook runs (e.g. annotation
//!    aggregations)
//! 3. if configured, coverage is recomputed right away; otherwise the
//!    maintenance processor is woken (if attached) to pick the change up

use crate::access::{can_read, can_write, AccessContext};
use crate::db::{DatabaseError, DomainEvent};
use crate::models::{Content, ContentPayload, ContentUpdate, Resource, User, ValidationError};
use crate::services::{CoverageService, MaintenanceWaker, ServiceContext, ServiceError};

#[derive(Debug, Clone)]
pub struct ContentService {
    ctx: ServiceContext,
    coverage: CoverageService,
    maintenance: Option<MaintenanceWaker>,
}

impl ContentService {
    pub fn new(ctx: ServiceContext, coverage: CoverageService) -> Self {
        Self {
            ctx,
            coverage,
            maintenance: None,
        }
    }

    /// Wake a maintenance processor after content changes
    pub fn with_maintenance_waker(mut self, waker: MaintenanceWaker) -> Self {
        self.maintenance = Some(waker);
        self
    }

    /// Create the content of a resource at a location
    ///
    /// Fails with `Conflict` if the resource already has content there.
    pub async fn create(
        &self,
        user: &User,
        resource_id: &str,
        location_id: &str,
        mut payload: ContentPayload,
    ) -> Result<Content, ServiceError> {
        let access = self.ctx.access_context().await?;
        let resource = self.writable(resource_id, user, &access).await?;
        self.check_location(&resource, location_id).await?;
        self.validate_payload(&resource, &mut payload)?;

        let mut content = Content::new(resource_id, location_id, payload);
        let now = self.ctx.clock.now();
        content.created_at = now;
        content.modified_at = now;

        let content = match self.ctx.store.create_content(content).await {
            Ok(content) => content,
            Err(DatabaseError::Conflict { context }) => return Err(ServiceError::conflict(context)),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(resource_id, location_id, content_id = %content.id, "Created content");

        self.contents_changed(resource, location_id).await?;
        Ok(content)
    }

    pub async fn get(&self, user: Option<&User>, content_id: &str) -> Result<Content, ServiceError> {
        let content = self.require_content(content_id).await?;
        let access = self.ctx.access_context().await?;
        let resource = self.ctx.require_resource(&content.resource_id).await?;
        if !can_read(&resource, user, &access) {
            return Err(ServiceError::not_found("content", content_id));
        }
        Ok(content)
    }

    /// All contents of a resource the user may read
    pub async fn list(&self, user: Option<&User>, resource_id: &str) -> Result<Vec<Content>, ServiceError> {
        let access = self.ctx.access_context().await?;
        let resource = self.ctx.require_resource(resource_id).await?;
        if !can_read(&resource, user, &access) {
            return Err(ServiceError::not_found("resource", resource_id));
        }
        Ok(self.ctx.store.find_contents(resource_id).await?)
    }

    pub async fn update(
        &self,
        user: &User,
        content_id: &str,
        mut update: ContentUpdate,
    ) -> Result<Content, ServiceError> {
        let mut content = self.require_content(content_id).await?;
        let access = self.ctx.access_context().await?;
        let resource = self.writable(&content.resource_id, user, &access).await?;

        if let Some(payload) = update.payload.as_mut() {
            self.validate_payload(&resource, payload)?;
        }
        if update.is_empty() {
            return Ok(content);
        }

        update.apply_to(&mut content);
        content.validate_annotations()?;
        content.modified_at = self.ctx.clock.now();
        let content = self.ctx.store.replace_content(content).await?;
        tracing::debug!(content_id, "Updated content");

        self.contents_changed(resource, &content.location_id).await?;
        Ok(content)
    }

    pub async fn delete(&self, user: &User, content_id: &str) -> Result<(), ServiceError> {
        let content = self.require_content(content_id).await?;
        let access = self.ctx.access_context().await?;
        let resource = self.writable(&content.resource_id, user, &access).await?;

        if !self.ctx.store.delete_content(content_id).await? {
            return Err(ServiceError::not_found("content", content_id));
        }
        tracing::debug!(content_id, "Deleted content");

        self.contents_changed(resource, &content.location_id).await
    }

    /// Change hook run after every content mutation
    async fn contents_changed(&self, mut resource: Resource, location_id: &str) -> Result<(), ServiceError> {
        resource.contents_changed_at = self.ctx.clock.now();
        if let Some(behavior) = self.ctx.registry.get(resource.resource_type) {
            let contents = self.ctx.store.find_contents(&resource.id).await?;
            if behavior.contents_changed(&mut resource, &contents) {
                tracing::debug!(resource_id = %resource.id, "Resource type hook updated resource");
            }
        }
        let resource = self.ctx.store.replace_resource(resource).await?;

        self.ctx.emit_event(DomainEvent::ContentChanged {
            resource_id: resource.id.clone(),
            location_id: location_id.to_string(),
        });

        if self.ctx.config.recompute_coverage_on_change {
            self.coverage.compute_coverage(&resource).await?;
        } else if let Some(maintenance) = &self.maintenance {
            maintenance.wake();
        }
        Ok(())
    }

    async fn require_content(&self, id: &str) -> Result<Content, ServiceError> {
        self.ctx
            .store
            .get_content(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("content", id))
    }

    /// Fetch a resource the user may write; unreadable ones are not found
    async fn writable(
        &self,
        resource_id: &str,
        user: &User,
        access: &AccessContext,
    ) -> Result<Resource, ServiceError> {
        let resource = self.ctx.require_resource(resource_id).await?;
        if !can_read(&resource, Some(user), access) {
            return Err(ServiceError::not_found("resource", resource_id));
        }
        if !can_write(&resource, Some(user), access) {
            return Err(ServiceError::forbidden(format!(
                "No write access to resource {}",
                resource_id
            )));
        }
        Ok(resource)
    }

    /// The location must belong to the resource's text and level
    async fn check_location(&self, resource: &Resource, location_id: &str) -> Result<(), ServiceError> {
        match self.ctx.store.get_location(location_id).await? {
            Some(location) if location.text_id == resource.text_id && location.level == resource.level => Ok(()),
            _ => Err(ValidationError::InvalidLocation(location_id.to_string()).into()),
        }
    }

    fn validate_payload(&self, resource: &Resource, payload: &mut ContentPayload) -> Result<(), ServiceError> {
        let behavior = self.ctx.registry.get(resource.resource_type).ok_or_else(|| {
            ValidationError::InvalidValue(format!(
                "Unsupported resource type: {}",
                resource.resource_type
            ))
        })?;
        behavior.validate_content(payload)?;
        Ok(())
    }
}

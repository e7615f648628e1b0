//! Resource Service - Authorized Resource Operations
//!
//! Drives the access-control predicates and the publication state machine:
//!
//! - create / get / list with permission-aware [`ResourceRead`] views
//! - partial updates (share lists are dropped on public resources)
//! - publication transitions (propose, unpropose, publish, unpublish)
//! - ownership transfer and deletion
//! - export to generic and type-specific formats
//!
//! Resources a user cannot read are reported as `NotFound`; resources a user
//! can read but not modify produce `Forbidden`.

use serde_json::json;
use std::collections::HashMap;

use crate::access::{
    can_manage, can_read, can_write, read_predicate, strip_share_updates_if_public,
    validate_transition, AccessContext, PublicationAction, ResourceRead,
};
use crate::db::DomainEvent;
use crate::models::{
    Content, ExportFormat, ExportedFile, PublicationStatus, Resource, ResourceCreate,
    ResourceUpdate, Text, User, ValidationError,
};
use crate::services::{ServiceContext, ServiceError};

#[derive(Debug, Clone)]
pub struct ResourceService {
    ctx: ServiceContext,
}

impl ResourceService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a private resource
    ///
    /// Regular users always own what they create; superusers may create
    /// resources for another user and own them otherwise. The level must
    /// exist in the text's level structure.
    pub async fn create(&self, user: &User, create: ResourceCreate) -> Result<ResourceRead, ServiceError> {
        let store = &self.ctx.store;

        let owner_id = if user.is_superuser {
            create.owner_id.clone().or_else(|| Some(user.id.clone()))
        } else {
            Some(user.id.clone())
        };
        if let Some(owner_id) = &owner_id {
            if store.get_user(owner_id).await?.is_none() {
                return Err(ValidationError::UnknownUser(owner_id.clone()).into());
            }
        }
        let Some(text) = store.get_text(&create.text_id).await? else {
            return Err(ValidationError::InvalidValue(format!("Unknown text: {}", create.text_id)).into());
        };
        if !text.has_level(create.level) {
            return Err(ValidationError::InvalidValue(format!(
                "Text {} has no level {}",
                text.id, create.level
            ))
            .into());
        }
        if let Some(original_id) = &create.original_id {
            if store.get_resource(original_id).await?.is_none() {
                return Err(ValidationError::InvalidValue(format!(
                    "Unknown original resource: {}",
                    original_id
                ))
                .into());
            }
        }

        let resource = create.into_resource(owner_id);
        resource.validate()?;
        let resource = store.create_resource(resource).await?;

        tracing::info!(
            resource_id = %resource.id,
            resource_type = %resource.resource_type,
            "Created resource"
        );
        self.ctx
            .emit_event(DomainEvent::ResourceCreated(Box::new(resource.clone())));

        let access = self.ctx.access_context().await?;
        Ok(ResourceRead::for_user(resource, Some(user), &access))
    }

    /// Read a single resource
    pub async fn get(&self, id: &str, user: Option<&User>) -> Result<ResourceRead, ServiceError> {
        let access = self.ctx.access_context().await?;
        let resource = self.readable(id, user, &access).await?;
        Ok(ResourceRead::for_user(resource, user, &access))
    }

    /// All resources `user` may read
    pub async fn list(&self, user: Option<&User>) -> Result<Vec<ResourceRead>, ServiceError> {
        let access = self.ctx.access_context().await?;
        let filter = read_predicate(user, &access);
        let resources = self.ctx.store.find_resources(&filter).await?;
        Ok(resources
            .into_iter()
            .map(|r| ResourceRead::for_user(r, user, &access))
            .collect())
    }

    /// Apply a partial update
    ///
    /// Share list changes are silently dropped if the resource is public or
    /// the user is neither its owner nor a superuser.
    pub async fn update(
        &self,
        id: &str,
        user: &User,
        update: ResourceUpdate,
    ) -> Result<ResourceRead, ServiceError> {
        let access = self.ctx.access_context().await?;
        let mut resource = self.readable(id, Some(user), &access).await?;
        if !can_write(&resource, Some(user), &access) {
            return Err(ServiceError::forbidden(format!("No write access to resource {}", id)));
        }

        let mut update = update.normalized();
        if strip_share_updates_if_public(&resource, &mut update) {
            tracing::debug!(resource_id = %id, "Dropped share updates on public resource");
        }
        if update.touches_shares() && !can_manage(&resource, Some(user)) {
            tracing::debug!(resource_id = %id, user_id = %user.id, "Dropped share updates from non-owner");
            update.shared_read = None;
            update.shared_write = None;
        }
        if let Some(shared_read) = update.shared_read.take() {
            update.shared_read = Some(self.checked_shares("sharedRead", shared_read).await?);
        }
        if let Some(shared_write) = update.shared_write.take() {
            update.shared_write = Some(self.checked_shares("sharedWrite", shared_write).await?);
        }

        if update.is_empty() {
            return Ok(ResourceRead::for_user(resource, Some(user), &access));
        }

        update.apply_to(&mut resource);
        resource.validate()?;
        let resource = self.ctx.store.replace_resource(resource).await?;
        self.ctx
            .emit_event(DomainEvent::ResourceUpdated(Box::new(resource.clone())));
        Ok(ResourceRead::for_user(resource, Some(user), &access))
    }

    /// Move a resource through the publication state machine
    ///
    /// Proposing and unproposing requires ownership (or superuser rights);
    /// publishing and unpublishing is reserved to superusers. A resource the
    /// user cannot read is reported as `NotFound` before any permission check.
    pub async fn transition(
        &self,
        id: &str,
        user: &User,
        action: PublicationAction,
    ) -> Result<ResourceRead, ServiceError> {
        let access = self.ctx.access_context().await?;
        let mut resource = self.readable(id, Some(user), &access).await?;

        let allowed = match action {
            PublicationAction::Propose | PublicationAction::Unpropose => {
                can_manage(&resource, Some(user))
            }
            PublicationAction::Publish | PublicationAction::Unpublish => user.is_superuser,
        };
        if !allowed {
            return Err(ServiceError::forbidden(format!(
                "Not allowed to {} resource {}",
                action, id
            )));
        }

        let from = resource.publication_status();
        let delta = validate_transition(from, action)?;
        delta.apply_to(&mut resource);
        let resource = self.ctx.store.replace_resource(resource).await?;

        tracing::info!(
            resource_id = %id,
            %action,
            from = ?from,
            to = ?resource.publication_status(),
            "Resource publication status changed"
        );
        self.ctx
            .emit_event(DomainEvent::ResourceUpdated(Box::new(resource.clone())));
        Ok(ResourceRead::for_user(resource, Some(user), &access))
    }

    /// Transfer ownership of a non-public resource to another user
    pub async fn transfer(
        &self,
        id: &str,
        user: &User,
        target_user_id: &str,
    ) -> Result<ResourceRead, ServiceError> {
        let access = self.ctx.access_context().await?;
        let mut resource = self.readable(id, Some(user), &access).await?;
        if !can_manage(&resource, Some(user)) {
            return Err(ServiceError::forbidden(format!("Not allowed to transfer resource {}", id)));
        }
        if resource.publication_status() == PublicationStatus::Public {
            return Err(ValidationError::InvalidValue("Public resources cannot be transferred".to_string()).into());
        }
        if self.ctx.store.get_user(target_user_id).await?.is_none() {
            return Err(ValidationError::UnknownUser(target_user_id.to_string()).into());
        }
        if resource.is_owned_by(target_user_id) {
            return Ok(ResourceRead::for_user(resource, Some(user), &access));
        }

        resource.owner_id = Some(target_user_id.to_string());
        // The new owner doesn't need shares on their own resource
        resource.shared_read.retain(|u| u != target_user_id);
        resource.shared_write.retain(|u| u != target_user_id);
        let resource = self.ctx.store.replace_resource(resource).await?;

        tracing::info!(resource_id = %id, owner_id = %target_user_id, "Transferred resource");
        self.ctx
            .emit_event(DomainEvent::ResourceUpdated(Box::new(resource.clone())));
        Ok(ResourceRead::for_user(resource, Some(user), &access))
    }

    /// Delete a private resource together with its contents and artifacts
    pub async fn delete(&self, id: &str, user: &User) -> Result<(), ServiceError> {
        let access = self.ctx.access_context().await?;
        let resource = self.readable(id, Some(user), &access).await?;
        if !can_manage(&resource, Some(user)) {
            return Err(ServiceError::forbidden(format!("Not allowed to delete resource {}", id)));
        }
        if resource.publication_status() != PublicationStatus::Private {
            return Err(ValidationError::InvalidValue(
                "Public or proposed resources cannot be deleted".to_string(),
            )
            .into());
        }

        if !self.ctx.store.delete_resource(id).await? {
            return Err(ServiceError::not_found("resource", id));
        }
        tracing::info!(resource_id = %id, "Deleted resource");
        self.ctx
            .emit_event(DomainEvent::ResourceDeleted { id: id.to_string() });
        Ok(())
    }

    /// Export all contents of a resource
    ///
    /// `json` and `tekst-json` work for every resource type; other formats
    /// are delegated to the resource type's behavior.
    pub async fn export(
        &self,
        id: &str,
        user: Option<&User>,
        format: ExportFormat,
    ) -> Result<ExportedFile, ServiceError> {
        let access = self.ctx.access_context().await?;
        let resource = self.readable(id, user, &access).await?;
        let store = &self.ctx.store;

        let text = store
            .get_text(&resource.text_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("text", &resource.text_id))?;
        let locations = store.find_locations_up_to(&text.id, resource.level).await?;
        let labels = text.full_location_labels(&locations, resource.level);
        let contents = store.find_contents(&resource.id).await?;

        let body = match format {
            ExportFormat::Json => generic_json(&text, &resource, &contents, &labels)?,
            ExportFormat::TekstJson => serde_json::to_string_pretty(&json!({
                "text": text.id,
                "resource": resource,
                "contents": contents,
            }))
            .map_err(crate::behaviors::ExportError::from)?,
            other => {
                let behavior = self.ctx.registry.get(resource.resource_type).ok_or_else(|| {
                    ValidationError::UnsupportedExportFormat {
                        format: other.to_string(),
                        resource_type: resource.resource_type.to_string(),
                    }
                })?;
                behavior.export(&resource, &contents, &labels, other)?
            }
        };

        tracing::debug!(resource_id = %id, %format, contents = contents.len(), "Exported resource");
        Ok(ExportedFile {
            filename: format!(
                "{}_resource_{}_export.{}",
                slug(&text.title),
                resource.id,
                format.extension()
            ),
            mimetype: format.mimetype(),
            body,
        })
    }

    /// Fetch a resource the user may read, hiding the others
    async fn readable(
        &self,
        id: &str,
        user: Option<&User>,
        access: &AccessContext,
    ) -> Result<Resource, ServiceError> {
        let resource = self.ctx.require_resource(id).await?;
        if can_read(&resource, user, access) {
            Ok(resource)
        } else {
            Err(ServiceError::not_found("resource", id))
        }
    }

    /// Deduplicate a share list and check that all users exist
    async fn checked_shares(&self, field: &str, user_ids: Vec<String>) -> Result<Vec<String>, ServiceError> {
        let mut unique: Vec<String> = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if !unique.contains(&user_id) {
                unique.push(user_id);
            }
        }

        let max = self.ctx.config.max_shares;
        if unique.len() > max {
            return Err(ValidationError::too_long(field, unique.len(), max).into());
        }
        for user_id in &unique {
            if self.ctx.store.get_user(user_id).await?.is_none() {
                return Err(ValidationError::UnknownUser(user_id.clone()).into());
            }
        }
        Ok(unique)
    }
}

/// Generic JSON export: location labels with the type-specific payload
fn generic_json(
    text: &Text,
    resource: &Resource,
    contents: &[Content],
    labels: &HashMap<String, String>,
) -> Result<String, crate::behaviors::ExportError> {
    let data: Vec<serde_json::Value> = contents
        .iter()
        .map(|content| -> Result<serde_json::Value, serde_json::Error> {
            let mut entry = serde_json::to_value(&content.payload)?;
            if let Some(object) = entry.as_object_mut() {
                object.remove("resourceType");
                object.insert(
                    "location".to_string(),
                    json!(labels.get(&content.location_id)),
                );
                object.insert("comment".to_string(), json!(content.comment));
            }
            Ok(entry)
        })
        .collect::<Result<_, _>>()?;

    Ok(serde_json::to_string_pretty(&json!({
        "text": text.title,
        "resource": {
            "id": resource.id,
            "title": resource.title,
            "resourceType": resource.resource_type,
            "level": resource.level,
            "citation": resource.citation,
        },
        "data": data,
    }))?)
}

/// Lowercase ASCII slug for file names
fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "text".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "resource_service_test.rs"]
mod resource_service_test;

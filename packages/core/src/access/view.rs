//! Permission-aware read view of a resource
//!
//! Share lists are restricted to the owner and superusers; everybody else
//! receives `None` for them. `writable` tells the requester whether a write
//! would be accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{can_see_shares, can_write, AccessContext};
use crate::models::{AnnotationAggregation, Resource, ResourceType, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRead {
    pub id: String,
    pub resource_type: ResourceType,
    pub title: String,
    pub description: Option<String>,
    pub text_id: String,
    pub level: u32,
    pub original_id: Option<String>,
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_read: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_write: Option<Vec<String>>,
    pub public: bool,
    pub proposed: bool,
    pub citation: Option<String>,
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Vec<AnnotationAggregation>>,
    pub contents_changed_at: DateTime<Utc>,
    pub writable: bool,
}

impl ResourceRead {
    /// Compose the view of `resource` for `user`
    pub fn for_user(resource: Resource, user: Option<&User>, ctx: &AccessContext) -> Self {
        let writable = can_write(&resource, user, ctx);
        let shares_visible = can_see_shares(&resource, user);

        Self {
            shared_read: shares_visible.then_some(resource.shared_read),
            shared_write: shares_visible.then_some(resource.shared_write),
            id: resource.id,
            resource_type: resource.resource_type,
            title: resource.title,
            description: resource.description,
            text_id: resource.text_id,
            level: resource.level,
            original_id: resource.original_id,
            owner_id: resource.owner_id,
            public: resource.public,
            proposed: resource.proposed,
            citation: resource.citation,
            comment: resource.comment,
            aggregations: resource.aggregations,
            contents_changed_at: resource.contents_changed_at,
            writable,
        }
    }
}

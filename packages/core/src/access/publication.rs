//! Publication state machine
//!
//! ```text
//!            propose               publish
//! Private ───────────▶ Proposed ───────────▶ Public
//!    ▲   ◀───────────              (clears owner and shares)
//!    │     unpropose                            │
//!    └──────────────────────────────────────────┘
//!                     unpublish
//! ```
//!
//! This module only decides legality and yields the attribute deltas to
//! apply; persisting them is the caller's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::{PublicationStatus, Resource, ResourceUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PublicationAction {
    Propose,
    Unpropose,
    Publish,
    Unpublish,
}

impl fmt::Display for PublicationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublicationAction::Propose => "propose",
            PublicationAction::Unpropose => "unpropose",
            PublicationAction::Publish => "publish",
            PublicationAction::Unpublish => "unpublish",
        };
        f.write_str(name)
    }
}

/// Reason a transition was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRejection {
    #[error("Resource is already public")]
    AlreadyPublic,

    #[error("Resource is not proposed for publication")]
    NotProposed,

    #[error("Resource is not public")]
    NotPublic,
}

impl TransitionRejection {
    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            TransitionRejection::AlreadyPublic => "resourceAlreadyPublic",
            TransitionRejection::NotProposed => "resourceNotProposed",
            TransitionRejection::NotPublic => "resourceNotPublic",
        }
    }
}

/// Attribute changes resulting from a legal transition
///
/// `owner_id` uses the double-Option pattern: `Some(None)` clears the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDelta {
    pub public: bool,
    pub proposed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_read: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_write: Option<Vec<String>>,
}

impl TransitionDelta {
    fn flags(public: bool, proposed: bool) -> Self {
        Self {
            public,
            proposed,
            owner_id: None,
            shared_read: None,
            shared_write: None,
        }
    }

    pub fn apply_to(self, resource: &mut Resource) {
        resource.public = self.public;
        resource.proposed = self.proposed;
        if let Some(owner_id) = self.owner_id {
            resource.owner_id = owner_id;
        }
        if let Some(shared_read) = self.shared_read {
            resource.shared_read = shared_read;
        }
        if let Some(shared_write) = self.shared_write {
            resource.shared_write = shared_write;
        }
    }
}

/// Check whether `action` is legal in state `current` and compute its delta
pub fn validate_transition(
    current: PublicationStatus,
    action: PublicationAction,
) -> Result<TransitionDelta, TransitionRejection> {
    use PublicationAction::*;
    use PublicationStatus::*;

    match (action, current) {
        (Propose, Public) => Err(TransitionRejection::AlreadyPublic),
        (Propose, Private | Proposed) => Ok(TransitionDelta::flags(false, true)),

        (Unpropose, Proposed) => Ok(TransitionDelta::flags(false, false)),
        (Unpropose, Private | Public) => Err(TransitionRejection::NotProposed),

        (Publish, Proposed) => Ok(TransitionDelta {
            public: true,
            proposed: false,
            owner_id: Some(None),
            shared_read: Some(Vec::new()),
            shared_write: Some(Vec::new()),
        }),
        (Publish, Public) => Err(TransitionRejection::AlreadyPublic),
        (Publish, Private) => Err(TransitionRejection::NotProposed),

        (Unpublish, Public) => Ok(TransitionDelta::flags(false, false)),
        (Unpublish, Private | Proposed) => Err(TransitionRejection::NotPublic),
    }
}

/// Drop share-list changes from an update if the resource is public
///
/// Public resources have no owner and no shares, so share updates on them
/// are discarded without error. Returns whether anything was dropped.
pub fn strip_share_updates_if_public(resource: &Resource, update: &mut ResourceUpdate) -> bool {
    if resource.publication_status() != PublicationStatus::Public || !update.touches_shares() {
        return false;
    }
    update.shared_read = None;
    update.shared_write = None;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceType;

    fn resource_in(status: PublicationStatus) -> Resource {
        let mut r = Resource::new(
            ResourceType::PlainText,
            "r".to_string(),
            "t".to_string(),
            0,
            Some("owner".to_string()),
        );
        r.public = status == PublicationStatus::Public;
        r.proposed = status == PublicationStatus::Proposed;
        r.shared_read = vec!["reader".to_string()];
        r.shared_write = vec!["writer".to_string()];
        r
    }

    #[test]
    fn test_propose() {
        assert_eq!(
            validate_transition(PublicationStatus::Public, PublicationAction::Propose),
            Err(TransitionRejection::AlreadyPublic)
        );
        let delta =
            validate_transition(PublicationStatus::Private, PublicationAction::Propose).unwrap();
        assert!(delta.proposed && !delta.public);
        // proposing again goes through unchanged
        assert_eq!(
            validate_transition(PublicationStatus::Proposed, PublicationAction::Propose),
            Ok(delta)
        );
    }

    #[test]
    fn test_unpropose() {
        assert_eq!(
            validate_transition(PublicationStatus::Private, PublicationAction::Unpropose),
            Err(TransitionRejection::NotProposed)
        );
        let mut r = resource_in(PublicationStatus::Proposed);
        validate_transition(r.publication_status(), PublicationAction::Unpropose)
            .unwrap()
            .apply_to(&mut r);
        assert_eq!(r.publication_status(), PublicationStatus::Private);
        assert_eq!(r.owner_id.as_deref(), Some("owner"));
    }

    #[test]
    fn test_publish_only_from_proposed() {
        assert_eq!(
            validate_transition(PublicationStatus::Private, PublicationAction::Publish),
            Err(TransitionRejection::NotProposed)
        );
        assert_eq!(
            validate_transition(PublicationStatus::Public, PublicationAction::Publish),
            Err(TransitionRejection::AlreadyPublic)
        );
    }

    #[test]
    fn test_publish_clears_owner_and_shares() {
        let mut r = resource_in(PublicationStatus::Proposed);
        let delta = validate_transition(r.publication_status(), PublicationAction::Publish).unwrap();
        assert_eq!(delta.owner_id, Some(None));
        assert_eq!(delta.shared_read, Some(vec![]));
        assert_eq!(delta.shared_write, Some(vec![]));

        delta.apply_to(&mut r);
        assert_eq!(r.publication_status(), PublicationStatus::Public);
        assert!(r.owner_id.is_none());
        assert!(r.shared_read.is_empty());
        assert!(r.shared_write.is_empty());
    }

    #[test]
    fn test_unpublish() {
        assert_eq!(
            validate_transition(PublicationStatus::Private, PublicationAction::Unpublish),
            Err(TransitionRejection::NotPublic)
        );
        assert_eq!(
            validate_transition(PublicationStatus::Proposed, PublicationAction::Unpublish),
            Err(TransitionRejection::NotPublic)
        );
        let mut r = resource_in(PublicationStatus::Public);
        validate_transition(r.publication_status(), PublicationAction::Unpublish)
            .unwrap()
            .apply_to(&mut r);
        assert_eq!(r.publication_status(), PublicationStatus::Private);
    }

    #[test]
    fn test_share_updates_dropped_on_public_resource() {
        let r = resource_in(PublicationStatus::Public);
        let mut update = ResourceUpdate {
            title: Some("still applied".to_string()),
            shared_read: Some(vec!["x".to_string()]),
            ..Default::default()
        };
        assert!(strip_share_updates_if_public(&r, &mut update));
        assert!(update.shared_read.is_none());
        assert_eq!(update.title.as_deref(), Some("still applied"));
    }

    #[test]
    fn test_share_updates_kept_on_private_resource() {
        let r = resource_in(PublicationStatus::Private);
        let mut update = ResourceUpdate {
            shared_write: Some(vec!["x".to_string()]),
            ..Default::default()
        };
        assert!(!strip_share_updates_if_public(&r, &mut update));
        assert!(update.shared_write.is_some());
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(TransitionRejection::NotPublic.code(), "resourceNotPublic");
        assert_eq!(
            TransitionRejection::AlreadyPublic.to_string(),
            "Resource is already public"
        );
    }
}

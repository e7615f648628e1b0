//! Content Data Structures
//!
//! A content is the payload of one resource at one location. The payload
//! shape depends on the resource type and is modelled as a closed, tagged
//! enum; type-specific validation and indexing live in [`crate::behaviors`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ResourceType, ValidationError};

const MAX_COMMENT_LENGTH: usize = 50_000;
const MAX_NOTES_LENGTH: usize = 1_000;

/// Editor mode last used for a rich text content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Wysiwyg,
    Html,
}

/// A single key/value annotation on a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    pub key: String,
    pub value: String,
}

/// A text token with its annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub token: String,

    #[serde(default)]
    pub annotations: Vec<AnnotationEntry>,
}

/// Type-specific content payload
///
/// Serialized with a `resourceType` tag matching [`ResourceType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType", rename_all = "camelCase")]
pub enum ContentPayload {
    #[serde(rename_all = "camelCase")]
    PlainText { text: String },

    #[serde(rename_all = "camelCase")]
    RichText {
        html: String,
        #[serde(default)]
        editor_mode: EditorMode,
    },

    #[serde(rename_all = "camelCase")]
    TextAnnotation { tokens: Vec<AnnotatedToken> },
}

impl ContentPayload {
    /// Resource type this payload belongs to
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ContentPayload::PlainText { .. } => ResourceType::PlainText,
            ContentPayload::RichText { .. } => ResourceType::RichText,
            ContentPayload::TextAnnotation { .. } => ResourceType::TextAnnotation,
        }
    }
}

/// Content of a resource at a single location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: String,

    pub resource_id: String,

    pub location_id: String,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(flatten)]
    pub payload: ContentPayload,

    pub created_at: DateTime<Utc>,

    pub modified_at: DateTime<Utc>,
}

impl Content {
    /// Create a new content with auto-generated UUID
    pub fn new(
        resource_id: impl Into<String>,
        location_id: impl Into<String>,
        payload: ContentPayload,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            resource_id: resource_id.into(),
            location_id: location_id.into(),
            comment: None,
            notes: None,
            payload,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.payload.resource_type()
    }

    /// Validate comment and notes lengths
    pub fn validate_annotations(&self) -> Result<(), ValidationError> {
        if let Some(comment) = &self.comment {
            super::check_length("comment", comment, 0, MAX_COMMENT_LENGTH)?;
        }
        if let Some(notes) = &self.notes {
            super::check_length("notes", notes, 0, MAX_NOTES_LENGTH)?;
        }
        Ok(())
    }
}

/// Partial content update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUpdate {
    /// Replacement payload; must have the resource's type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ContentPayload>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::resource::deserialize_optional_field"
    )]
    pub comment: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::resource::deserialize_optional_field"
    )]
    pub notes: Option<Option<String>>,
}

impl ContentUpdate {
    pub fn is_empty(&self) -> bool {
        self.payload.is_none() && self.comment.is_none() && self.notes.is_none()
    }

    /// Apply this update, cleaning up comment and notes
    pub fn apply_to(self, content: &mut Content) {
        if let Some(payload) = self.payload {
            content.payload = payload;
        }
        if let Some(comment) = self.comment {
            content.comment = clean_annotation_text(comment);
        }
        if let Some(notes) = self.notes {
            content.notes = clean_annotation_text(notes);
        }
    }
}

fn clean_annotation_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| super::cleanup_multiline(&v))
        .filter(|v| !v.is_empty())
}

//! Resource Data Structures
//!
//! A resource describes a set of data (its contents) on one level of a text.
//! Visibility is governed by ownership, share lists and the two publication
//! flags `public` and `proposed`.
//!
//! # Examples
//!
//! ```rust
//! use tekst_core::models::{PublicationStatus, Resource, ResourceType};
//!
//! let resource = Resource::new(
//!     ResourceType::PlainText,
//!     "Translation".to_string(),
//!     "text-1".to_string(),
//!     1,
//!     Some("user-1".to_string()),
//! );
//! assert_eq!(resource.publication_status(), PublicationStatus::Private);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Initial `contents_changed_at` for resources that never had contents changed
pub fn default_contents_changed_at() -> DateTime<Utc> {
    Utc.timestamp_opt(86_400, 0).single().unwrap_or_default()
}

/// Tag identifying one of the available resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    PlainText,
    RichText,
    TextAnnotation,
}

impl ResourceType {
    /// All resource types in registration order
    pub const ALL: [ResourceType; 3] = [
        ResourceType::PlainText,
        ResourceType::RichText,
        ResourceType::TextAnnotation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::PlainText => "plainText",
            ResourceType::RichText => "richText",
            ResourceType::TextAnnotation => "textAnnotation",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                ValidationError::InvalidValue(format!(
                    "Given resource type ({}) is not a valid resource type name",
                    s
                ))
            })
    }
}

/// Publication state derived from the `public`/`proposed` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PublicationStatus {
    Private,
    Proposed,
    Public,
}

/// One aggregated annotation key of a text annotation resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationAggregation {
    pub key: String,

    /// Distinct values, most frequent first; omitted for keys with too many distinct values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// A resource describing a set of data on a text level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,

    pub resource_type: ResourceType,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub text_id: String,

    /// Text level this resource belongs to
    pub level: u32,

    /// If this is a version of another resource, this references the original
    #[serde(default)]
    pub original_id: Option<String>,

    /// `None` means platform-owned
    #[serde(default)]
    pub owner_id: Option<String>,

    #[serde(default)]
    pub shared_read: Vec<String>,

    #[serde(default)]
    pub shared_write: Vec<String>,

    #[serde(default)]
    pub public: bool,

    #[serde(default)]
    pub proposed: bool,

    #[serde(default)]
    pub citation: Option<String>,

    #[serde(default)]
    pub comment: Option<String>,

    /// Annotation aggregations (text annotation resources only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Vec<AnnotationAggregation>>,

    /// The last time contents of this resource changed
    #[serde(default = "default_contents_changed_at")]
    pub contents_changed_at: DateTime<Utc>,
}

impl Resource {
    /// Create a new private resource with auto-generated UUID
    pub fn new(
        resource_type: ResourceType,
        title: String,
        text_id: String,
        level: u32,
        owner_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            resource_type,
            title,
            description: None,
            text_id,
            level,
            original_id: None,
            owner_id,
            shared_read: Vec::new(),
            shared_write: Vec::new(),
            public: false,
            proposed: false,
            citation: None,
            comment: None,
            aggregations: None,
            contents_changed_at: default_contents_changed_at(),
        }
    }

    /// Current publication state
    ///
    /// `public` wins over `proposed` should both flags ever be set.
    pub fn publication_status(&self) -> PublicationStatus {
        if self.public {
            PublicationStatus::Public
        } else if self.proposed {
            PublicationStatus::Proposed
        } else {
            PublicationStatus::Private
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }

    /// Validate field constraints
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }
        if self.text_id.is_empty() {
            return Err(ValidationError::MissingField("text_id".to_string()));
        }
        super::check_length("title", self.title.trim(), 1, 64)?;
        if let Some(description) = &self.description {
            super::check_length("description", description, 0, 512)?;
        }
        if let Some(citation) = &self.citation {
            super::check_length("citation", citation, 0, 1000)?;
        }
        if let Some(comment) = &self.comment {
            super::check_length("comment", comment, 0, 2000)?;
        }
        Ok(())
    }
}

/// Payload for creating a new resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCreate {
    pub resource_type: ResourceType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub text_id: String,
    pub level: u32,
    #[serde(default)]
    pub original_id: Option<String>,
    /// Only honoured for superusers; regular users always own what they create
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ResourceCreate {
    /// Build the private resource this payload describes
    pub fn into_resource(self, owner_id: Option<String>) -> Resource {
        let mut resource = Resource::new(
            self.resource_type,
            super::cleanup_oneline(&self.title),
            self.text_id,
            self.level,
            owner_id,
        );
        resource.description = super::cleanup_optional_oneline(self.description.as_deref());
        resource.original_id = self.original_id;
        resource.citation = super::cleanup_optional_oneline(self.citation.as_deref());
        resource.comment = self
            .comment
            .map(|c| super::cleanup_multiline(&c))
            .filter(|c| !c.is_empty());
        resource
    }
}

/// Deserialize a nullable field for partial updates
///
/// - Missing field → None (don't update)
/// - null → Some(None) (clear)
/// - "value" → Some(Some("value"))
pub(crate) fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial resource update for PATCH operations
///
/// Only provided fields are changed. Publication flags and ownership are not
/// part of this structure: they change exclusively through publication
/// transitions and transfers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub description: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub citation: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub comment: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_read: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_write: Option<Vec<String>>,
}

impl ResourceUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.citation.is_none()
            && self.comment.is_none()
            && self.shared_read.is_none()
            && self.shared_write.is_none()
    }

    /// Whether this update touches either share list
    pub fn touches_shares(&self) -> bool {
        self.shared_read.is_some() || self.shared_write.is_some()
    }

    /// Normalize text fields the way they are persisted
    ///
    /// Titles and descriptions are cleaned to a single line, citations too
    /// (empty citations become `None`), comments keep their line breaks.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| super::cleanup_oneline(&t));
        self.description = self
            .description
            .map(|d| super::cleanup_optional_oneline(d.as_deref()));
        self.citation = self
            .citation
            .map(|c| super::cleanup_optional_oneline(c.as_deref()));
        self.comment = self.comment.map(|c| {
            c.map(|c| super::cleanup_multiline(&c))
                .filter(|c| !c.is_empty())
        });
        self
    }

    /// Apply this update to a resource in place
    pub fn apply_to(self, resource: &mut Resource) {
        if let Some(title) = self.title {
            resource.title = title;
        }
        if let Some(description) = self.description {
            resource.description = description;
        }
        if let Some(citation) = self.citation {
            resource.citation = citation;
        }
        if let Some(comment) = self.comment {
            resource.comment = comment;
        }
        if let Some(shared_read) = self.shared_read {
            resource.shared_read = shared_read;
        }
        if let Some(shared_write) = self.shared_write {
            resource.shared_write = shared_write;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource() -> Resource {
        Resource::new(
            ResourceType::PlainText,
            "Foo".to_string(),
            "text-1".to_string(),
            0,
            Some("owner".to_string()),
        )
    }

    #[test]
    fn test_publication_status_from_flags() {
        let mut r = resource();
        assert_eq!(r.publication_status(), PublicationStatus::Private);
        r.proposed = true;
        assert_eq!(r.publication_status(), PublicationStatus::Proposed);
        r.proposed = false;
        r.public = true;
        assert_eq!(r.publication_status(), PublicationStatus::Public);
    }

    #[test]
    fn test_resource_type_names() {
        assert_eq!(ResourceType::TextAnnotation.as_str(), "textAnnotation");
        assert_eq!(
            "richText".parse::<ResourceType>().unwrap(),
            ResourceType::RichText
        );
        assert!("plaintext".parse::<ResourceType>().is_err());
        assert_eq!(
            serde_json::to_value(ResourceType::PlainText).unwrap(),
            json!("plainText")
        );
    }

    #[test]
    fn test_default_contents_changed_at_is_one_day_after_epoch() {
        let r = resource();
        assert_eq!(r.contents_changed_at.timestamp(), 86_400);
    }

    #[test]
    fn test_update_double_option_deserialization() {
        let update: ResourceUpdate =
            serde_json::from_value(json!({ "citation": null, "title": "Bar" })).unwrap();
        assert_eq!(update.citation, Some(None));
        assert_eq!(update.description, None);
        assert_eq!(update.title, Some("Bar".to_string()));
    }

    #[test]
    fn test_update_ignores_publication_flags() {
        let update: ResourceUpdate =
            serde_json::from_value(json!({ "public": true, "proposed": true })).unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_update_normalization_and_apply() {
        let mut r = resource();
        let update = ResourceUpdate {
            title: Some("  New   title ".to_string()),
            description: Some(Some("a\n  b".to_string())),
            citation: Some(Some("   ".to_string())),
            ..Default::default()
        }
        .normalized();
        update.apply_to(&mut r);

        assert_eq!(r.title, "New title");
        assert_eq!(r.description.as_deref(), Some("a b"));
        assert_eq!(r.citation, None);
    }

    #[test]
    fn test_validate_title_length() {
        let mut r = resource();
        assert!(r.validate().is_ok());
        r.title = "x".repeat(65);
        assert!(r.validate().is_err());
        r.title = "  ".to_string();
        assert!(r.validate().is_err());
    }
}

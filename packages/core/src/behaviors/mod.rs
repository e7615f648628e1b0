//! Resource Type Behavior System
//!
//! This module provides the trait-based behavior system for the resource types:
//!
//! - `ResourceTypeBehavior` trait - type-specific validation, indexing, search and export
//! - Built-in behaviors (`PlainTextBehavior`, `RichTextBehavior`, `TextAnnotationBehavior`)
//! - `ResourceTypeRegistry` - lookup of a behavior by its resource type tag
//!
//! Content payloads are a closed set of tagged variants (see
//! [`ContentPayload`]); behaviors receive the whole payload and reject the
//! variants that don't belong to them.

mod plain_text;
mod rich_text;
mod text_annotation;

pub use plain_text::PlainTextBehavior;
pub use rich_text::RichTextBehavior;
pub use text_annotation::{aggregate_annotations, TextAnnotationBehavior};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::CoreConfig;
use crate::models::{
    Content, ContentPayload, ExportFormat, Resource, ResourceType, ValidationError,
};

/// Export failures
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Export failed: {0}")]
    Io(String),
}

/// An annotation criterion of a text annotation search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationQueryEntry {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Type-specific part of a resource search query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SearchQuery {
    PlainText {
        #[serde(default)]
        text: String,
    },
    RichText {
        #[serde(default)]
        html: String,
    },
    TextAnnotation {
        #[serde(default)]
        token: String,
        #[serde(default, rename = "anno")]
        annotations: Vec<AnnotationQueryEntry>,
    },
}

impl SearchQuery {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            SearchQuery::PlainText { .. } => ResourceType::PlainText,
            SearchQuery::RichText { .. } => ResourceType::RichText,
            SearchQuery::TextAnnotation { .. } => ResourceType::TextAnnotation,
        }
    }
}

/// Index field prefix of a resource's contents
pub(crate) fn index_field(resource_id: &str) -> String {
    format!("resources.{}", resource_id)
}

/// Query matching every indexed document that has contents of the resource
pub(crate) fn exists_query(resource_id: &str) -> Value {
    json!({ "exists": { "field": index_field(resource_id) } })
}

/// Whether a query string is empty or consists only of wildcards
pub(crate) fn is_match_all(query: &str) -> bool {
    query.trim_matches(|c: char| c == '*' || c.is_whitespace()).is_empty()
}

/// Type-specific behavior of a resource type
pub trait ResourceTypeBehavior: Send + Sync {
    fn resource_type(&self) -> ResourceType;

    /// Validate a content payload, normalizing it in place
    fn validate_content(&self, payload: &mut ContentPayload) -> Result<(), ValidationError>;

    /// Type-specific data of a content for the search index
    fn index_document(&self, content: &Content) -> Value;

    /// Search index queries for a query on one resource
    fn search_queries(&self, resource_id: &str, query: &SearchQuery, strict: bool) -> Vec<Value>;

    /// Fields searched by quick search
    fn quick_search_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Export contents in a type-specific format
    ///
    /// `labels` maps location IDs to full location labels. Generic formats
    /// are handled by the caller; the default rejects everything.
    fn export(
        &self,
        _resource: &Resource,
        _contents: &[Content],
        _labels: &HashMap<String, String>,
        format: ExportFormat,
    ) -> Result<String, ExportError> {
        Err(self.unsupported_format(format).into())
    }

    /// React to changed contents; returns whether `resource` was modified
    fn contents_changed(&self, _resource: &mut Resource, _contents: &[Content]) -> bool {
        false
    }

    fn type_mismatch(&self, payload: &ContentPayload) -> ValidationError {
        ValidationError::ResourceTypeMismatch {
            resource_type: self.resource_type().to_string(),
            content_type: payload.resource_type().to_string(),
        }
    }

    fn unsupported_format(&self, format: ExportFormat) -> ValidationError {
        ValidationError::UnsupportedExportFormat {
            format: format.to_string(),
            resource_type: self.resource_type().to_string(),
        }
    }
}

/// Registry mapping resource type tags to their behaviors
#[derive(Clone, Default)]
pub struct ResourceTypeRegistry {
    behaviors: HashMap<ResourceType, Arc<dyn ResourceTypeBehavior>>,
}

impl ResourceTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all built-in resource types
    pub fn with_builtin_types(config: &CoreConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PlainTextBehavior));
        registry.register(Arc::new(RichTextBehavior));
        registry.register(Arc::new(TextAnnotationBehavior::new(
            config.annotation_aggregation_values_limit,
        )));
        registry
    }

    /// Register a behavior, replacing any previous one for the same type
    pub fn register(&mut self, behavior: Arc<dyn ResourceTypeBehavior>) {
        self.behaviors.insert(behavior.resource_type(), behavior);
    }

    pub fn get(&self, resource_type: ResourceType) -> Option<Arc<dyn ResourceTypeBehavior>> {
        self.behaviors.get(&resource_type).cloned()
    }

    /// Registered resource types in a stable order
    pub fn list(&self) -> Vec<ResourceType> {
        let mut types: Vec<ResourceType> = self.behaviors.keys().copied().collect();
        types.sort();
        types
    }
}

impl std::fmt::Debug for ResourceTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTypeRegistry")
            .field("types", &self.list())
            .finish()
    }
}

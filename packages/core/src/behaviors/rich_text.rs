//! Rich text resource type

use serde_json::{json, Value};

use super::{exists_query, index_field, is_match_all, ResourceTypeBehavior, SearchQuery};
use crate::models::{check_length, Content, ContentPayload, ResourceType, ValidationError};
use crate::utils::html_text;

const MAX_HTML_LENGTH: usize = 102_400;

/// A simple rich text resource type
///
/// Only the generic export formats are supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextBehavior;

impl ResourceTypeBehavior for RichTextBehavior {
    fn resource_type(&self) -> ResourceType {
        ResourceType::RichText
    }

    fn validate_content(&self, payload: &mut ContentPayload) -> Result<(), ValidationError> {
        match payload {
            ContentPayload::RichText { html, .. } => {
                *html = html.trim().to_string();
                check_length("html", html, 0, MAX_HTML_LENGTH)
            }
            other => Err(self.type_mismatch(other)),
        }
    }

    fn index_document(&self, content: &Content) -> Value {
        match &content.payload {
            ContentPayload::RichText { html, .. } => json!({ "html": html_text(html) }),
            _ => Value::Null,
        }
    }

    fn search_queries(&self, resource_id: &str, query: &SearchQuery, strict: bool) -> Vec<Value> {
        let SearchQuery::RichText { html } = query else {
            return Vec::new();
        };
        if is_match_all(html) {
            return vec![exists_query(resource_id)];
        }
        let strict_suffix = if strict { ".strict" } else { "" };
        vec![json!({
            "simple_query_string": {
                "fields": [format!("{}.html{}", index_field(resource_id), strict_suffix)],
                "query": html,
            }
        })]
    }
}

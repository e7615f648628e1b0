//! Plain text resource type

use serde_json::{json, Value};
use std::collections::HashMap;

use super::{exists_query, index_field, is_match_all, ExportError, ResourceTypeBehavior, SearchQuery};
use crate::models::{
    check_length, Content, ContentPayload, ExportFormat, Resource, ResourceType, ValidationError,
};

const MAX_TEXT_LENGTH: usize = 102_400;

/// A simple plain text resource type
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextBehavior;

impl PlainTextBehavior {
    fn export_csv(
        contents: &[Content],
        labels: &HashMap<String, String>,
    ) -> Result<String, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());
        writer.write_record(["LOCATION", "TEXT", "COMMENT"])?;

        for content in contents {
            let ContentPayload::PlainText { text } = &content.payload else {
                continue;
            };
            let label = labels.get(&content.location_id).map(String::as_str).unwrap_or("");
            writer.write_record([label, text.as_str(), content.comment.as_deref().unwrap_or("")])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.error().to_string()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl ResourceTypeBehavior for PlainTextBehavior {
    fn resource_type(&self) -> ResourceType {
        ResourceType::PlainText
    }

    fn validate_content(&self, payload: &mut ContentPayload) -> Result<(), ValidationError> {
        match payload {
            ContentPayload::PlainText { text } => {
                *text = text.trim().to_string();
                check_length("text", text, 1, MAX_TEXT_LENGTH)
            }
            other => Err(self.type_mismatch(other)),
        }
    }

    fn index_document(&self, content: &Content) -> Value {
        match &content.payload {
            ContentPayload::PlainText { text } => json!({ "text": text }),
            _ => Value::Null,
        }
    }

    fn search_queries(&self, resource_id: &str, query: &SearchQuery, strict: bool) -> Vec<Value> {
        let SearchQuery::PlainText { text } = query else {
            return Vec::new();
        };
        if is_match_all(text) {
            return vec![exists_query(resource_id)];
        }
        let strict_suffix = if strict { ".strict" } else { "" };
        vec![json!({
            "simple_query_string": {
                "fields": [format!("{}.text{}", index_field(resource_id), strict_suffix)],
                "query": text,
                "analyze_wildcard": true,
            }
        })]
    }

    fn quick_search_fields(&self) -> &'static [&'static str] {
        &["text"]
    }

    fn export(
        &self,
        _resource: &Resource,
        contents: &[Content],
        labels: &HashMap<String, String>,
        format: ExportFormat,
    ) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => Self::export_csv(contents, labels),
            other => Err(self.unsupported_format(other).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> ContentPayload {
        ContentPayload::PlainText {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_validate_trims_and_checks_length() {
        let mut payload = plain("  agnim ile  ");
        PlainTextBehavior.validate_content(&mut payload).unwrap();
        assert_eq!(payload, plain("agnim ile"));

        let mut empty = plain("   ");
        assert!(PlainTextBehavior.validate_content(&mut empty).is_err());
    }

    #[test]
    fn test_validate_rejects_other_payloads() {
        let mut payload = ContentPayload::TextAnnotation { tokens: vec![] };
        let err = PlainTextBehavior.validate_content(&mut payload).unwrap_err();
        assert!(matches!(err, ValidationError::ResourceTypeMismatch { .. }));
    }

    #[test]
    fn test_search_queries() {
        let match_all = PlainTextBehavior.search_queries(
            "r1",
            &SearchQuery::PlainText { text: "*".to_string() },
            false,
        );
        assert_eq!(match_all, vec![json!({ "exists": { "field": "resources.r1" } })]);

        let strict = PlainTextBehavior.search_queries(
            "r1",
            &SearchQuery::PlainText { text: "agni*".to_string() },
            true,
        );
        assert_eq!(
            strict[0]["simple_query_string"]["fields"][0],
            json!("resources.r1.text.strict")
        );
        assert_eq!(strict[0]["simple_query_string"]["query"], json!("agni*"));
    }

    #[test]
    fn test_csv_export_quotes_everything() {
        let resource = Resource::new(
            ResourceType::PlainText,
            "r".to_string(),
            "t".to_string(),
            0,
            None,
        );
        let mut content = Content::new(&resource.id, "loc-1", plain("say \"hi\""));
        content.comment = Some("c".to_string());
        let labels = HashMap::from([("loc-1".to_string(), "1, 1".to_string())]);

        let csv = PlainTextBehavior
            .export(&resource, &[content], &labels, ExportFormat::Csv)
            .unwrap();
        assert_eq!(
            csv,
            "\"LOCATION\",\"TEXT\",\"COMMENT\"\n\"1, 1\",\"say \"\"hi\"\"\",\"c\"\n"
        );
    }

    #[test]
    fn test_unsupported_export_format() {
        let resource = Resource::new(
            ResourceType::PlainText,
            "r".to_string(),
            "t".to_string(),
            0,
            None,
        );
        let result = PlainTextBehavior.export(&resource, &[], &HashMap::new(), ExportFormat::Html);
        assert!(matches!(
            result,
            Err(ExportError::Validation(ValidationError::UnsupportedExportFormat { .. }))
        ));
    }
}

//! Text annotation resource type
//!
//! Contents are lists of tokens, each carrying key/value annotations.
//! Whenever contents change, the resource's annotation aggregations are
//! recomputed so clients can offer the known keys and values.

use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::{exists_query, index_field, ResourceTypeBehavior, SearchQuery};
use crate::models::{
    check_length, AnnotationAggregation, Content, ContentPayload, Resource, ResourceType,
    ValidationError,
};

const MAX_TOKENS: usize = 1024;
const MAX_TOKEN_LENGTH: usize = 4096;
const MAX_ANNOTATIONS_PER_TOKEN: usize = 128;
const MAX_KEY_LENGTH: usize = 32;
const MAX_VALUE_LENGTH: usize = 64;

/// An annotation resource type for tokenized text
#[derive(Debug, Clone, Copy)]
pub struct TextAnnotationBehavior {
    values_limit: usize,
}

impl TextAnnotationBehavior {
    /// `values_limit` is the maximum number of distinct values an aggregated
    /// key may have for its values to be listed
    pub fn new(values_limit: usize) -> Self {
        Self { values_limit }
    }
}

/// Aggregate annotations of all contents by key
///
/// Keys are ordered by occurrence count (descending, ties by first
/// occurrence). Values are distinct and ordered the same way; they are
/// omitted for keys with more than `values_limit` distinct values.
pub fn aggregate_annotations(contents: &[Content], values_limit: usize) -> Vec<AnnotationAggregation> {
    struct KeyStats {
        first_seen: usize,
        count: usize,
        // value -> (count, first seen)
        values: HashMap<String, (usize, usize)>,
    }

    let mut stats: HashMap<String, KeyStats> = HashMap::new();
    let mut seen = 0usize;

    let annotations = contents
        .iter()
        .filter_map(|c| match &c.payload {
            ContentPayload::TextAnnotation { tokens } => Some(tokens),
            _ => None,
        })
        .flatten()
        .flat_map(|token| token.annotations.iter());

    for anno in annotations {
        let entry = stats.entry(anno.key.clone()).or_insert_with(|| KeyStats {
            first_seen: seen,
            count: 0,
            values: HashMap::new(),
        });
        entry.count += 1;
        let value = entry.values.entry(anno.value.clone()).or_insert((0, seen));
        value.0 += 1;
        seen += 1;
    }

    let mut keys: Vec<(String, KeyStats)> = stats.into_iter().collect();
    keys.sort_by(|(_, a), (_, b)| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)));

    keys.into_iter()
        .map(|(key, key_stats)| {
            let values = (key_stats.values.len() <= values_limit).then(|| {
                let mut values: Vec<(String, (usize, usize))> =
                    key_stats.values.into_iter().collect();
                values.sort_by(|(_, (ca, fa)), (_, (cb, fb))| cb.cmp(ca).then(fa.cmp(fb)));
                values.into_iter().map(|(v, _)| v).collect()
            });
            AnnotationAggregation { key, values }
        })
        .collect()
}

impl ResourceTypeBehavior for TextAnnotationBehavior {
    fn resource_type(&self) -> ResourceType {
        ResourceType::TextAnnotation
    }

    fn validate_content(&self, payload: &mut ContentPayload) -> Result<(), ValidationError> {
        let tokens = match payload {
            ContentPayload::TextAnnotation { tokens } => tokens,
            other => return Err(self.type_mismatch(other)),
        };
        if tokens.len() > MAX_TOKENS {
            return Err(ValidationError::too_long("tokens", tokens.len(), MAX_TOKENS));
        }
        for token in tokens.iter_mut() {
            token.token = token.token.trim().to_string();
            check_length("token", &token.token, 1, MAX_TOKEN_LENGTH)?;
            if token.annotations.len() > MAX_ANNOTATIONS_PER_TOKEN {
                return Err(ValidationError::too_long(
                    "annotations",
                    token.annotations.len(),
                    MAX_ANNOTATIONS_PER_TOKEN,
                ));
            }
            for anno in token.annotations.iter_mut() {
                anno.key = anno.key.trim().to_string();
                anno.value = anno.value.trim().to_string();
                check_length("key", &anno.key, 1, MAX_KEY_LENGTH)?;
                check_length("value", &anno.value, 1, MAX_VALUE_LENGTH)?;
            }
        }
        Ok(())
    }

    fn index_document(&self, content: &Content) -> Value {
        let ContentPayload::TextAnnotation { tokens } = &content.payload else {
            return Value::Null;
        };
        let tokens: Vec<Value> = tokens
            .iter()
            .map(|token| {
                let annotations: Map<String, Value> = token
                    .annotations
                    .iter()
                    .map(|a| (a.key.clone(), Value::String(a.value.clone())))
                    .collect();
                json!({ "token": token.token, "annotations": annotations })
            })
            .collect();
        json!({ "tokens": tokens })
    }

    fn search_queries(&self, resource_id: &str, query: &SearchQuery, strict: bool) -> Vec<Value> {
        let SearchQuery::TextAnnotation { token, annotations } = query else {
            return Vec::new();
        };
        let tokens_path = format!("{}.tokens", index_field(resource_id));
        let strict_suffix = if strict { ".strict" } else { "" };

        let mut must: Vec<Value> = Vec::new();
        let token = token.trim();
        if !token.is_empty() {
            must.push(json!({
                "term": { format!("{}.token{}", tokens_path, strict_suffix): token }
            }));
        }
        for entry in annotations {
            let (Some(key), Some(value)) = (entry.key.as_deref(), entry.value.as_deref()) else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                continue;
            }
            must.push(json!({
                "term": { format!("{}.annotations.{}", tokens_path, key): value }
            }));
        }

        if must.is_empty() {
            return vec![exists_query(resource_id)];
        }
        vec![json!({
            "nested": {
                "path": tokens_path,
                "query": { "bool": { "must": must } },
            }
        })]
    }

    fn contents_changed(&self, resource: &mut Resource, contents: &[Content]) -> bool {
        let aggregations = Some(aggregate_annotations(contents, self.values_limit));
        if resource.aggregations == aggregations {
            return false;
        }
        resource.aggregations = aggregations;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnnotatedToken, AnnotationEntry};

    fn token(text: &str, annos: &[(&str, &str)]) -> AnnotatedToken {
        AnnotatedToken {
            token: text.to_string(),
            annotations: annos
                .iter()
                .map(|(k, v)| AnnotationEntry {
                    key: k.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    fn content(tokens: Vec<AnnotatedToken>) -> Content {
        Content::new("r", "l", ContentPayload::TextAnnotation { tokens })
    }

    #[test]
    fn test_aggregation_orders_keys_and_values_by_count() {
        let contents = vec![
            content(vec![
                token("agnim", &[("pos", "noun"), ("case", "acc")]),
                token("ile", &[("pos", "verb")]),
            ]),
            content(vec![token("purohitam", &[("pos", "noun")])]),
        ];
        let aggs = aggregate_annotations(&contents, 3);

        assert_eq!(aggs.len(), 2);
        assert_eq!(aggs[0].key, "pos");
        assert_eq!(
            aggs[0].values,
            Some(vec!["noun".to_string(), "verb".to_string()])
        );
        assert_eq!(aggs[1].key, "case");
        assert_eq!(aggs[1].values, Some(vec!["acc".to_string()]));
    }

    #[test]
    fn test_aggregation_omits_values_over_limit() {
        let contents = vec![content(vec![
            token("a", &[("lemma", "a")]),
            token("b", &[("lemma", "b")]),
            token("c", &[("lemma", "c")]),
            token("d", &[("lemma", "d")]),
        ])];
        let aggs = aggregate_annotations(&contents, 3);
        assert_eq!(aggs[0].key, "lemma");
        assert_eq!(aggs[0].values, None);
    }

    #[test]
    fn test_contents_changed_updates_resource_aggregations() {
        let mut resource = Resource::new(
            ResourceType::TextAnnotation,
            "r".to_string(),
            "t".to_string(),
            0,
            None,
        );
        let behavior = TextAnnotationBehavior::new(3);
        let contents = vec![content(vec![token("a", &[("pos", "noun")])])];

        assert!(behavior.contents_changed(&mut resource, &contents));
        assert!(!behavior.contents_changed(&mut resource, &contents));
        assert_eq!(resource.aggregations.as_ref().unwrap()[0].key, "pos");
    }

    #[test]
    fn test_validate_limits() {
        let behavior = TextAnnotationBehavior::new(3);
        let mut ok = ContentPayload::TextAnnotation {
            tokens: vec![token(" a ", &[(" pos ", " noun ")])],
        };
        behavior.validate_content(&mut ok).unwrap();
        assert_eq!(
            ok,
            ContentPayload::TextAnnotation {
                tokens: vec![token("a", &[("pos", "noun")])]
            }
        );

        let key = "k".repeat(33);
        let mut long_key = ContentPayload::TextAnnotation {
            tokens: vec![token("a", &[(key.as_str(), "v")])],
        };
        assert!(behavior.validate_content(&mut long_key).is_err());
    }

    #[test]
    fn test_search_nested_query() {
        let behavior = TextAnnotationBehavior::new(3);
        let query = SearchQuery::TextAnnotation {
            token: "agnim".to_string(),
            annotations: vec![crate::behaviors::AnnotationQueryEntry {
                key: Some("pos".to_string()),
                value: Some("noun".to_string()),
            }],
        };
        let queries = behavior.search_queries("r1", &query, false);
        let nested = &queries[0]["nested"];
        assert_eq!(nested["path"], json!("resources.r1.tokens"));
        assert_eq!(
            nested["query"]["bool"]["must"][1],
            json!({ "term": { "resources.r1.tokens.annotations.pos": "noun" } })
        );
    }

    #[test]
    fn test_search_empty_query_matches_existing() {
        let behavior = TextAnnotationBehavior::new(3);
        let query = SearchQuery::TextAnnotation {
            token: String::new(),
            annotations: vec![],
        };
        assert_eq!(
            behavior.search_queries("r1", &query, false),
            vec![json!({ "exists": { "field": "resources.r1" } })]
        );
    }
}

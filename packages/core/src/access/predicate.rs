//! Declarative resource filters
//!
//! A [`Predicate`] is a small boolean expression over resource attributes.
//! Storage backends translate it into their native query language; the
//! in-process [`Predicate::matches`] evaluates it against a materialized
//! resource so that filtered queries and single-document checks can never
//! disagree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "camelCase")]
pub enum Predicate {
    /// Matches every resource
    All,
    /// Matches no resource
    Nothing,
    /// `public == value`
    Public(bool),
    /// `proposed == value`
    Proposed(bool),
    /// `owner_id == user id`
    OwnerIs(String),
    /// `user id ∈ shared_read`
    SharedReadContains(String),
    /// `user id ∈ shared_write`
    SharedWriteContains(String),
    /// `text_id ∈ ids`
    TextIdIn(BTreeSet<String>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Evaluate against an already-fetched resource
    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Nothing => false,
            Predicate::Public(value) => resource.public == *value,
            Predicate::Proposed(value) => resource.proposed == *value,
            Predicate::OwnerIs(user_id) => resource.is_owned_by(user_id),
            Predicate::SharedReadContains(user_id) => resource.shared_read.contains(user_id),
            Predicate::SharedWriteContains(user_id) => resource.shared_write.contains(user_id),
            Predicate::TextIdIn(ids) => ids.contains(&resource.text_id),
            Predicate::And(parts) => parts.iter().all(|p| p.matches(resource)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(resource)),
        }
    }

    /// Whether this predicate matches everything without looking at a resource
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Predicate::All)
    }

    /// Whether this predicate can never match
    pub fn is_unsatisfiable(&self) -> bool {
        match self {
            Predicate::Nothing => true,
            Predicate::And(parts) => parts.iter().any(Predicate::is_unsatisfiable),
            Predicate::Or(parts) => parts.iter().all(Predicate::is_unsatisfiable),
            Predicate::TextIdIn(ids) => ids.is_empty(),
            _ => false,
        }
    }
}

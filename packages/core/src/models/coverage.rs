//! Precomputed Coverage Data
//!
//! Coverage describes which locations on a resource's level have content.
//! It is precomputed by [`crate::services::CoverageService`] and stored as a
//! [`PrecomputedData`] artifact keyed by resource ID and artifact kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of a precomputed artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrecomputedKind {
    Coverage,
}

impl fmt::Display for PrecomputedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecomputedKind::Coverage => f.write_str("coverage"),
        }
    }
}

/// Coverage of a single location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCoverage {
    pub label: String,
    pub position: i64,
    #[serde(default)]
    pub covered: bool,
}

/// Coverage of all child locations of one parent location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentCoverage {
    /// Full label of the parent, `None` if there is no (known) parent
    pub label: Option<String>,
    pub locations: Vec<LocationCoverage>,
}

/// Coverage summary of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCoverage {
    /// Number of locations with content
    pub covered: usize,

    /// Number of locations on the resource's level
    pub total: usize,

    /// `[start label, end label]` of each reported range
    pub ranges: Vec<[String; 2]>,

    /// Whether `ranges` lists covered (`true`) or missing (`false`) spans
    pub ranges_covered: bool,

    pub details: Vec<ParentCoverage>,
}

impl ResourceCoverage {
    /// Coverage of a level without any locations
    pub fn empty() -> Self {
        Self {
            covered: 0,
            total: 0,
            ranges: Vec::new(),
            ranges_covered: true,
            details: Vec::new(),
        }
    }
}

/// Denormalized, cached computation result keyed to a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecomputedData {
    pub id: String,

    pub ref_id: String,

    pub kind: PrecomputedKind,

    pub created_at: DateTime<Utc>,

    pub data: ResourceCoverage,
}

impl PrecomputedData {
    /// Create a new coverage artifact for a resource
    pub fn coverage(ref_id: impl Into<String>, created_at: DateTime<Utc>, data: ResourceCoverage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ref_id: ref_id.into(),
            kind: PrecomputedKind::Coverage,
            created_at,
            data,
        }
    }

    /// Whether this artifact was created after the given point in time
    pub fn is_fresh(&self, changed_at: DateTime<Utc>) -> bool {
        self.created_at > changed_at
    }
}

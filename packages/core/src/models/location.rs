//! Text and Location Structures
//!
//! A text is structured as a tree of locations. Each location sits on a
//! level (0 = root level) and carries a position that defines the total
//! order of all locations on that level of its text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

fn default_loc_delim() -> String {
    ", ".to_string()
}

fn default_levels() -> Vec<String> {
    vec!["Level 1".to_string()]
}

/// A text that resources and locations belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub id: String,

    pub title: String,

    /// Names of the hierarchy levels, root level first
    #[serde(default = "default_levels")]
    pub levels: Vec<String>,

    /// Delimiter used to join the labels of a location path into a full label
    #[serde(default = "default_loc_delim")]
    pub loc_delim: String,

    /// Inactive texts are hidden from everybody but superusers
    #[serde(default)]
    pub is_active: bool,
}

impl Text {
    /// Create a new active single-level text with auto-generated UUID and
    /// default delimiter
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            levels: default_levels(),
            loc_delim: default_loc_delim(),
            is_active: true,
        }
    }

    /// Replace the level structure
    pub fn with_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.levels = levels.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_level(&self, level: u32) -> bool {
        (level as usize) < self.levels.len()
    }

    /// Compute full labels for all locations on `level`
    ///
    /// A full label is the chain of labels from the root level down to the
    /// location itself, joined with this text's `loc_delim`. `locations` must
    /// contain every location of this text on levels `0..=level`; locations
    /// of other texts or deeper levels are ignored. A location whose parent
    /// is missing from the input is labelled with its own label only.
    ///
    /// Returns a map of location ID to full label.
    pub fn full_location_labels<'a, I>(&self, locations: I, level: u32) -> HashMap<String, String>
    where
        I: IntoIterator<Item = &'a Location>,
    {
        let mut relevant: Vec<&Location> = locations
            .into_iter()
            .filter(|loc| loc.text_id == self.id && loc.level <= level)
            .collect();
        relevant.sort_by_key(|loc| (loc.level, loc.position));

        let mut full: HashMap<String, String> = HashMap::with_capacity(relevant.len());
        for loc in &relevant {
            let label = match loc.parent_id.as_ref().and_then(|p| full.get(p)) {
                Some(parent_label) => format!("{}{}{}", parent_label, self.loc_delim, loc.label),
                None => loc.label.clone(),
            };
            full.insert(loc.id.clone(), label);
        }

        relevant
            .iter()
            .filter(|loc| loc.level == level)
            .filter_map(|loc| full.remove(&loc.id).map(|label| (loc.id.clone(), label)))
            .collect()
    }
}

/// An ordered node in a text's location hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,

    pub text_id: String,

    /// Hierarchy level, 0 is the root level
    pub level: u32,

    /// Position within the level, unique per (text, level)
    pub position: i64,

    /// Parent location on `level - 1`, `None` on the root level
    pub parent_id: Option<String>,

    pub label: String,
}

impl Location {
    /// Create a new location with auto-generated UUID
    pub fn new(
        text_id: impl Into<String>,
        level: u32,
        position: i64,
        parent_id: Option<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text_id: text_id.into(),
            level,
            position,
            parent_id,
            label: label.into(),
        }
    }
}

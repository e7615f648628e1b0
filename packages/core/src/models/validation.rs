//! Validation Errors and Field Normalization
//!
//! Shared validation error type for all models plus the small string
//! normalization helpers applied to user-supplied text fields before they
//! are persisted.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Validation errors for model operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{field}' is too long ({len} > {max})")]
    TooLong {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("Field '{field}' is too short ({len} < {min})")]
    TooShort {
        field: String,
        len: usize,
        min: usize,
    },

    #[error("Content type '{content_type}' does not match resource type '{resource_type}'")]
    ResourceTypeMismatch {
        resource_type: String,
        content_type: String,
    },

    #[error("Invalid location reference: {0}")]
    InvalidLocation(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Unsupported export format '{format}' for resource type '{resource_type}'")]
    UnsupportedExportFormat {
        format: String,
        resource_type: String,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl ValidationError {
    /// Create a too-long error for a field
    pub fn too_long(field: impl Into<String>, len: usize, max: usize) -> Self {
        Self::TooLong {
            field: field.into(),
            len,
            max,
        }
    }

    /// Create a too-short error for a field
    pub fn too_short(field: impl Into<String>, len: usize, min: usize) -> Self {
        Self::TooShort {
            field: field.into(),
            len,
            min,
        }
    }
}

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Whitespace except line breaks
static HORIZONTAL_WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// Collapse every whitespace run (including newlines) into a single space and trim
pub fn cleanup_oneline(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").trim().to_string()
}

/// Collapse horizontal whitespace per line, trimming each line and the whole value
///
/// Line breaks are kept, but more than two consecutive ones are reduced to two.
pub fn cleanup_multiline(value: &str) -> String {
    let lines: Vec<String> = value
        .lines()
        .map(|line| HORIZONTAL_WHITESPACE_RE.replace_all(line, " ").trim().to_string())
        .collect();

    let mut out = String::with_capacity(value.len());
    let mut blank_run = 0;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() || !line.is_empty() {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

/// Cleanup a single-line optional field, mapping empty results to `None`
pub fn cleanup_optional_oneline(value: Option<&str>) -> Option<String> {
    value
        .map(cleanup_oneline)
        .filter(|cleaned| !cleaned.is_empty())
}

/// Check a string's character count against inclusive bounds
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::too_short(field, len, min));
    }
    if len > max {
        return Err(ValidationError::too_long(field, len, max));
    }
    Ok(())
}

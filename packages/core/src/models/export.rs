//! Resource export formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    Json,
    TekstJson,
    Csv,
    Txt,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Json,
        ExportFormat::TekstJson,
        ExportFormat::Csv,
        ExportFormat::Txt,
        ExportFormat::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::TekstJson => "tekst-json",
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
            ExportFormat::Html => "html",
        }
    }

    /// File extension used for exported files
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::TekstJson => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
            ExportFormat::Html => "html",
        }
    }

    pub fn mimetype(&self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::TekstJson => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Txt => "text/plain",
            ExportFormat::Html => "text/html",
        }
    }

    /// Formats every resource type can be exported to
    pub fn is_generic(&self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::TekstJson)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue(format!("Unknown export format: {}", s)))
    }
}

/// An exported resource, ready to be written to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub mimetype: &'static str,
    pub body: String,
}

//! Database Error Types
//!
//! Errors raised by storage backends. Missing records are not errors for
//! lookups (they return `Ok(None)`); these variants cover failed operations.

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// Record to update does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Uniqueness constraint violated
    #[error("Conflict: {context}")]
    Conflict { context: String },

    /// Backend cannot be reached
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Operation did not finish in time
    #[error("Database operation timed out: {operation}")]
    Timeout { operation: String },

    /// Stored data could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Query execution error with context
    #[error("Query failed: {context}")]
    QueryFailed { context: String },
}

impl DatabaseError {
    /// Create a not found error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(context: impl Into<String>) -> Self {
        Self::Conflict {
            context: context.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a query failed error with context
    pub fn query_failed(context: impl Into<String>) -> Self {
        Self::QueryFailed {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

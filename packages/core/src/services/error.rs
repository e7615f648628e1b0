//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations, providing
//! detailed error handling for business logic failures.

use crate::access::TransitionRejection;
use crate::behaviors::ExportError;
use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
///
/// Storage failures are propagated unchanged as [`ServiceError::Database`];
/// services never replace them with partial results.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Entity not found by ID (or not visible to the requesting user)
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Requesting user lacks the permission for this operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Publication state transition rejected
    #[error("Illegal transition: {0}")]
    IllegalTransition(#[from] TransitionRejection),

    /// Input validation failed
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Operation would violate a uniqueness or state constraint
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    /// Export could not be produced
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl ServiceError {
    /// Create a not found error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "notFound",
            Self::Forbidden(_) => "forbidden",
            Self::IllegalTransition(rejection) => rejection.code(),
            Self::Validation(_) => "validationFailed",
            Self::Conflict(_) => "conflict",
            Self::Database(DatabaseError::Timeout { .. }) => "timeout",
            Self::Database(_) => "storageFailure",
            Self::Export(_) => "exportFailed",
        }
    }
}

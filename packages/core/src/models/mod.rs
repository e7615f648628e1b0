//! Data Models
//!
//! This module contains the data structures shared by the coverage engine,
//! the access-control layer and the services:
//!
//! - `Text` / `Location` - the per-text location hierarchy
//! - `Resource` - dataset definition with ownership and publication flags
//! - `Content` - polymorphic payload of a resource at one location
//! - `PrecomputedData` - cached coverage artifacts
//! - `User` - requesting identity

mod content;
mod coverage;
mod export;
mod location;
mod resource;
mod user;
mod validation;

pub use content::{
    AnnotatedToken, AnnotationEntry, Content, ContentPayload, ContentUpdate, EditorMode,
};
pub use coverage::{
    LocationCoverage, ParentCoverage, PrecomputedData, PrecomputedKind, ResourceCoverage,
};
pub use export::{ExportFormat, ExportedFile};
pub use location::{Location, Text};
pub use resource::{
    default_contents_changed_at, AnnotationAggregation, PublicationStatus, Resource,
    ResourceCreate, ResourceType, ResourceUpdate,
};
pub use user::User;
pub use validation::{
    check_length, cleanup_multiline, cleanup_oneline, cleanup_optional_oneline, ValidationError,
};

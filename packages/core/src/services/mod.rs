//! Business Services
//!
//! This module contains the services driving the coverage engine and the
//! access-control layer:
//!
//! - `CoverageService` - memoized coverage precomputation per resource
//! - `ResourceService` - authorized reads, updates, publication transitions,
//!   transfers, deletion and export
//! - `ContentService` - content mutations and the content change hook
//! - `MaintenanceService` / `MaintenanceProcessor` - batched coverage
//!   recomputation, on demand or in the background
//! - `TekstCore` - all of the above wired around one `ServiceContext`
//!
//! Services coordinate between the storage layer and the pure access and
//! coverage logic; they log at their boundaries and return every failure
//! to the caller.

mod content_service;
mod context;
mod coverage_service;
pub mod error;
mod facade;
mod maintenance_service;
mod resource_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use content_service::ContentService;
pub use context::ServiceContext;
pub use coverage_service::{
    build_coverage, compress_ranges, group_by_parent, CoverageRecord, CoverageService,
};
pub use error::ServiceError;
pub use facade::TekstCore;
pub use maintenance_service::{
    MaintenanceProcessor, MaintenanceService, MaintenanceSummary, MaintenanceWaker,
};
pub use resource_service::ResourceService;

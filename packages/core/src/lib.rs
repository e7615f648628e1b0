//! Tekst Core - Coverage Engine and Resource Access Control
//!
//! This crate provides the core logic of the Tekst research data platform:
//! which locations of a text a resource covers, and who may see and change
//! which resources.
//!
//! # Architecture
//!
//! - **Pure core**: coverage compression and access predicates are plain
//!   functions over models, deterministic and side-effect free
//! - **Storage as collaborator**: services reach persistence only through the
//!   async [`db::TekstStore`] trait
//! - **Explicit context**: active texts, configuration and the time source
//!   are passed in, never read from globals
//!
//! # Modules
//!
//! - [`models`] - Data structures (Text, Location, Resource, Content, coverage)
//! - [`behaviors`] - Resource type system and trait-based behaviors
//! - [`access`] - Access predicates, publication state machine, read views
//! - [`services`] - Business services (CoverageService, ResourceService, etc.)
//! - [`db`] - Storage trait, in-memory store and domain events
//! - [`config`] / [`logging`] / [`clock`] - ambient configuration, tracing
//!   setup and time source

pub mod access;
pub mod behaviors;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use access::*;
pub use behaviors::*;
pub use config::CoreConfig;
pub use models::*;
pub use services::*;

//! Resource Access Control
//!
//! - [`Predicate`] - declarative resource filter usable by storage backends
//! - [`read_predicate`] / [`write_predicate`] - filters per requesting identity
//! - [`can_read`] / [`can_write`] - the same rules on a fetched resource
//! - [`validate_transition`] - publication state machine
//! - [`ResourceRead`] - permission-aware read view
//!
//! Everything here is pure: no storage access, no errors for denied access.

mod control;
mod predicate;
mod publication;
mod view;

pub use control::{
    can_manage, can_read, can_see_shares, can_write, read_predicate, write_predicate,
    AccessContext,
};
pub use predicate::Predicate;
pub use publication::{
    strip_share_updates_if_public, validate_transition, PublicationAction, TransitionDelta,
    TransitionRejection,
};
pub use view::ResourceRead;

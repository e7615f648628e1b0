//! Resource access-control predicate builder
//!
//! Builds the read/write filters for a requesting identity. Anonymous users
//! are represented by `None`. Predicate building never fails: denied access
//! is expressed as a predicate that matches nothing.

use std::collections::BTreeSet;

use super::Predicate;
use crate::models::{Resource, User};

/// Platform state the predicates depend on
///
/// Constructed by the caller per request (see
/// [`crate::db::TekstStore::get_active_text_ids`]) so predicate building stays
/// pure and deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    pub active_text_ids: BTreeSet<String>,
}

impl AccessContext {
    pub fn new<I, S>(active_text_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            active_text_ids: active_text_ids.into_iter().map(Into::into).collect(),
        }
    }

    fn active_texts(&self) -> Predicate {
        Predicate::TextIdIn(self.active_text_ids.clone())
    }
}

/// Filter for resources `user` may read
pub fn read_predicate(user: Option<&User>, ctx: &AccessContext) -> Predicate {
    match user {
        None => Predicate::And(vec![Predicate::Public(true), ctx.active_texts()]),
        Some(user) if user.is_superuser => Predicate::All,
        Some(user) => Predicate::And(vec![
            ctx.active_texts(),
            Predicate::Or(vec![
                Predicate::OwnerIs(user.id.clone()),
                Predicate::Public(true),
                Predicate::Proposed(true),
                Predicate::SharedReadContains(user.id.clone()),
                Predicate::SharedWriteContains(user.id.clone()),
            ]),
        ]),
    }
}

/// Filter for resources `user` may write
///
/// Public and proposed resources are read-only for regular users.
pub fn write_predicate(user: Option<&User>, ctx: &AccessContext) -> Predicate {
    match user {
        None => Predicate::Nothing,
        Some(user) if user.is_superuser => Predicate::All,
        Some(user) => Predicate::And(vec![
            ctx.active_texts(),
            Predicate::Public(false),
            Predicate::Proposed(false),
            Predicate::Or(vec![
                Predicate::OwnerIs(user.id.clone()),
                Predicate::SharedWriteContains(user.id.clone()),
            ]),
        ]),
    }
}

pub fn can_read(resource: &Resource, user: Option<&User>, ctx: &AccessContext) -> bool {
    read_predicate(user, ctx).matches(resource)
}

pub fn can_write(resource: &Resource, user: Option<&User>, ctx: &AccessContext) -> bool {
    write_predicate(user, ctx).matches(resource)
}

/// Whether `user` may see the share lists of `resource`
pub fn can_see_shares(resource: &Resource, user: Option<&User>) -> bool {
    match user {
        None => false,
        Some(user) => user.is_superuser || resource.is_owned_by(&user.id),
    }
}

/// Whether `user` may propose/unpropose, transfer or delete `resource`
pub fn can_manage(resource: &Resource, user: Option<&User>) -> bool {
    can_see_shares(resource, user)
}

#[cfg(test)]
#[path = "control_test.rs"]
mod control_test;

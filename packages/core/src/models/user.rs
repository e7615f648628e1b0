//! Requesting user identity
//!
//! Users are owned by the authentication layer; only the identifier and the
//! superuser flag matter for access control.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub is_superuser: bool,
}

impl User {
    /// Create a regular user with auto-generated UUID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            is_superuser: false,
        }
    }

    /// Create a superuser with auto-generated UUID
    pub fn superuser() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            is_superuser: true,
        }
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

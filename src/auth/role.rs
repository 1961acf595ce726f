//! Roles and privilege precedence.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::domain::RoleId;

/// Integer privilege level. Higher levels dominate lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleLevel(pub i32);

impl Display for RoleLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role row as stored in the `roles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub level: RoleLevel,
    pub description: Option<String>,
}

impl Role {
    pub const USER: &'static str = "user";
    pub const MODERATOR: &'static str = "moderator";
    pub const ADMIN: &'static str = "admin";

    /// True when this role grants at least the privilege of `required`.
    pub fn satisfies(&self, required: &Role) -> bool {
        self.level >= required.level
    }
}

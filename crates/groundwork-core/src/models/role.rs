//! Role domain model.
//!
//! Roles are stored on the user record as raw strings. Older accounts
//! carry historical names, so every permission check goes through
//! [`normalize_role`] first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GroundworkError;

/// Canonical role names used for permission checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TenantAdmin,
    Client,
    Subcontractor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantAdmin => "tenant_admin",
            Self::Client => "client",
            Self::Subcontractor => "subcontractor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = GroundworkError;

    /// Parses canonical names only. Use [`normalize_role`] for stored values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenant_admin" => Ok(Self::TenantAdmin),
            "client" => Ok(Self::Client),
            "subcontractor" => Ok(Self::Subcontractor),
            other => Err(GroundworkError::Validation {
                message: format!("unknown role: {other}"),
            }),
        }
    }
}

/// Revision of [`ROLE_ALIASES`]. Bump when an entry is added or removed.
pub const ROLE_ALIASES_VERSION: u32 = 1;

/// Stored role value -> canonical role.
///
/// v1: `admin` predates the multi-tenant rework and was renamed to
/// `tenant_admin`. Canonical names map to themselves.
pub const ROLE_ALIASES: &[(&str, Role)] = &[
    ("admin", Role::TenantAdmin),
    ("tenant_admin", Role::TenantAdmin),
    ("client", Role::Client),
    ("subcontractor", Role::Subcontractor),
];

/// Map a raw stored role to its canonical role, if it has one.
pub fn normalize_role(raw: &str) -> Option<Role> {
    ROLE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map(|(_, role)| *role)
}

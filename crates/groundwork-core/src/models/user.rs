//! User domain model.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GroundworkError;
use crate::models::role::{Role, normalize_role};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
    Locked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Locked => "Locked",
        }
    }
}

impl FromStr for UserStatus {
    type Err = GroundworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            "Locked" => Ok(Self::Locked),
            other => Err(GroundworkError::Validation {
                message: format!("unknown user status: {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unset only for accounts created before tenants existed.
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Raw stored role, possibly a legacy name.
    pub role: String,
    /// Added after launch; `None` counts as active.
    pub status: Option<UserStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Active or unset status.
    pub fn is_active(&self) -> bool {
        matches!(self.status, None | Some(UserStatus::Active))
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            tenant_id: self.tenant_id,
            role: self.role.clone(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: String,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<UserStatus>,
    /// Assigns a tenant to a legacy account.
    pub tenant_id: Option<Uuid>,
}

/// The authenticated actor of a request.
///
/// Built by the authentication layer before any tenancy guard runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: String,
    pub status: Option<UserStatus>,
}

impl Principal {
    /// Canonical role after legacy-name normalization.
    pub fn canonical_role(&self) -> Option<Role> {
        normalize_role(&self.role)
    }
}

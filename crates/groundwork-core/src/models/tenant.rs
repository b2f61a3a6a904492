//! Tenant domain model.
//!
//! A tenant is one customer organization. Every user, job site and
//! service entitlement belongs to exactly one tenant, and requests are
//! routed to a tenant by its subdomain.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GroundworkError;

/// Lifecycle status of a tenant.
///
/// Tenants are never physically deleted; they move to `Suspended` and
/// only come back through an explicit reactivation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Suspended,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl FromStr for TenantStatus {
    type Err = GroundworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            other => Err(GroundworkError::Validation {
                message: format!("unknown tenant status: {other}"),
            }),
        }
    }
}

/// Subscription plan tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Starter,
    Professional,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }
}

impl FromStr for PlanTier {
    type Err = GroundworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(Self::Starter),
            "professional" => Ok(Self::Professional),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(GroundworkError::Validation {
                message: format!("unknown plan tier: {other}"),
            }),
        }
    }
}

/// Per-resource quota ceilings. `None` means "use the configured default".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TenantLimits {
    pub max_users: Option<u64>,
    pub max_job_sites: Option<u64>,
    pub max_clients: Option<u64>,
    pub max_storage_mb: Option<u64>,
}

/// Resource kinds subject to quota enforcement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Users,
    JobSites,
    Clients,
    Storage,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Users,
        ResourceKind::JobSites,
        ResourceKind::Clients,
        ResourceKind::Storage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::JobSites => "job_sites",
            Self::Clients => "clients",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TenantLimits {
    /// The ceiling configured on the tenant record for `kind`, if any.
    pub fn ceiling(&self, kind: ResourceKind) -> Option<u64> {
        match kind {
            ResourceKind::Users => self.max_users,
            ResourceKind::JobSites => self.max_job_sites,
            ResourceKind::Clients => self.max_clients,
            ResourceKind::Storage => self.max_storage_mb,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Business name shown in the UI.
    pub name: String,
    /// Unique routing label; immutable after creation.
    pub subdomain: String,
    pub owner_email: String,
    pub owner_name: String,
    pub plan: PlanTier,
    pub status: TenantStatus,
    pub limits: TenantLimits,
    /// Cumulative storage usage, maintained incrementally by uploads.
    pub storage_used_mb: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub subdomain: String,
    pub owner_email: String,
    pub owner_name: String,
    pub plan: PlanTier,
    #[serde(default)]
    pub limits: TenantLimits,
}

/// Fields that can be updated on an existing tenant.
///
/// The subdomain is deliberately absent: it never changes after creation.
/// Status changes go through `suspend` / `reactivate`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub plan: Option<PlanTier>,
    pub limits: Option<TenantLimits>,
}

/// Check that a subdomain is a usable DNS label.
pub fn validate_subdomain(subdomain: &str) -> Result<(), GroundworkError> {
    let valid_chars = subdomain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if subdomain.is_empty()
        || subdomain.len() > 63
        || !valid_chars
        || subdomain.starts_with('-')
        || subdomain.ends_with('-')
        || subdomain == "www"
    {
        return Err(GroundworkError::Validation {
            message: format!("invalid subdomain: {subdomain:?}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_validation() {
        assert!(validate_subdomain("acme-builders").is_ok());
        assert!(validate_subdomain("b2").is_ok());
        assert!(validate_subdomain("").is_err());
        assert!(validate_subdomain("www").is_err());
        assert!(validate_subdomain("Acme").is_err());
        assert!(validate_subdomain("-acme").is_err());
        assert!(validate_subdomain("acme.builders").is_err());
        assert!(validate_subdomain(&"a".repeat(64)).is_err());
    }

    #[test]
    fn limits_fall_through_per_kind() {
        let limits = TenantLimits {
            max_users: Some(3),
            ..Default::default()
        };
        assert_eq!(limits.ceiling(ResourceKind::Users), Some(3));
        assert_eq!(limits.ceiling(ResourceKind::Clients), None);
    }
}

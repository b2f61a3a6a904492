//! Optional services and per-tenant entitlements.
//!
//! The catalog ([`ServiceDefinition`]) is global. Each tenant gets at
//! most one [`ServiceEntitlement`] per service, and at most one
//! [`ServiceUsage`] counter per service per calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry describing an optional capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: Uuid,
    /// Stable machine name, e.g. `crm_sync`.
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Presentation order in the services page.
    pub sort_order: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceDefinition {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub sort_order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntitlement {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub enabled: bool,
    pub enabled_at: Option<DateTime<Utc>>,
    pub disabled_at: Option<DateTime<Utc>>,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for an entitlement upsert keyed by (tenant, service).
#[derive(Debug, Clone)]
pub struct UpsertEntitlement {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub enabled: bool,
    /// `None` keeps existing settings (or `{}` for a new row).
    pub settings: Option<serde_json::Value>,
}

/// Daily call counter for a (tenant, service) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceUsage {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub day: NaiveDate,
    pub call_count: u64,
}

//! Groundwork Tenancy: tenant resolution, tenant-scoped authorization,
//! plan quotas and per-tenant service entitlements.
//!
//! Every component is generic over the repository traits of
//! `groundwork-core` and receives its storage at construction.

pub mod config;
pub mod entitlement;
pub mod error;
pub mod guard;
pub mod quota;
pub mod resolver;
pub mod usage;

pub use config::{DefaultTenant, Environment, QuotaDefaults, TenancyConfig};
pub use entitlement::{EntitlementChange, EntitlementService};
pub use error::TenancyError;
pub use guard::{TenantGuard, require_role};
pub use quota::{QuotaEnforcer, QuotaStatus};
pub use resolver::{
    ResolutionSource, ResolvedTenant, TenantRequest, TenantResolver, subdomain_from_host,
};
pub use usage::{DEFAULT_QUEUE_CAPACITY, UsageTracker};

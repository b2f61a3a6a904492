//! Tenancy configuration.

use std::fmt;
use std::str::FromStr;

use groundwork_core::models::tenant::{CreateTenant, PlanTier, ResourceKind, TenantLimits};

/// Deployment environment the process runs in. Unset means production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    Test,
    #[default]
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        })
    }
}

/// Ceilings applied when the tenant record has none for a resource kind.
#[derive(Debug, Clone, Copy)]
pub struct QuotaDefaults {
    pub max_users: u64,
    pub max_job_sites: u64,
    pub max_clients: u64,
    pub max_storage_mb: u64,
}

impl Default for QuotaDefaults {
    fn default() -> Self {
        Self {
            max_users: 10,
            max_job_sites: 25,
            max_clients: 50,
            max_storage_mb: 5120,
        }
    }
}

impl QuotaDefaults {
    pub fn for_kind(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Users => self.max_users,
            ResourceKind::JobSites => self.max_job_sites,
            ResourceKind::Clients => self.max_clients,
            ResourceKind::Storage => self.max_storage_mb,
        }
    }
}

/// Tenant record provisioned by the single-tenant fallback when storage
/// holds no tenant at all.
#[derive(Debug, Clone)]
pub struct DefaultTenant {
    pub name: String,
    pub subdomain: String,
    pub owner_email: String,
    pub owner_name: String,
    pub plan: PlanTier,
}

impl Default for DefaultTenant {
    fn default() -> Self {
        Self {
            name: "Default Tenant".into(),
            subdomain: "default".into(),
            owner_email: "admin@localhost".into(),
            owner_name: "Administrator".into(),
            plan: PlanTier::Starter,
        }
    }
}

impl DefaultTenant {
    pub fn to_create(&self) -> CreateTenant {
        CreateTenant {
            name: self.name.clone(),
            subdomain: self.subdomain.clone(),
            owner_email: self.owner_email.clone(),
            owner_name: self.owner_name.clone(),
            plan: self.plan,
            limits: TenantLimits::default(),
        }
    }
}

/// Configuration shared by the tenancy components.
#[derive(Debug, Clone, Default)]
pub struct TenancyConfig {
    pub environment: Environment,
    /// Permit the development fallbacks. Ignored in production.
    pub single_tenant_mode: bool,
    pub quota_defaults: QuotaDefaults,
    pub default_tenant: DefaultTenant,
}

impl TenancyConfig {
    /// Whether the single-tenant escape hatches may be used: the
    /// first-tenant fallback during resolution and admitting principals
    /// that have no tenant yet.
    pub fn relaxed_mode(&self) -> bool {
        self.single_tenant_mode && self.environment != Environment::Production
    }
}

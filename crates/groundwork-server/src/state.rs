//! Shared application state.

use std::ops::Deref;
use std::sync::Arc;

use groundwork_db::repository::{
    SurrealJobSiteRepository, SurrealServiceRepository, SurrealTenantRepository,
    SurrealUsageRepository, SurrealUserRepository,
};
use groundwork_tenancy::{
    EntitlementService, QuotaEnforcer, TenancyConfig, TenantGuard, TenantResolver, UsageTracker,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use crate::auth::AuthConfig;

pub type Users = SurrealUserRepository<Any>;
pub type JobSites = SurrealJobSiteRepository<Any>;

/// Every component a request handler or guard may need, built once at
/// start-up around a single database client.
pub struct AppContext {
    pub resolver: TenantResolver<SurrealTenantRepository<Any>>,
    pub guard: TenantGuard,
    pub quotas: QuotaEnforcer<Users, JobSites>,
    pub entitlements: EntitlementService<SurrealServiceRepository<Any>, SurrealUsageRepository<Any>>,
    pub users: Users,
    pub job_sites: JobSites,
    pub tracker: UsageTracker,
    pub auth: AuthConfig,
}

#[derive(Clone)]
pub struct AppState(Arc<AppContext>);

impl AppState {
    /// Wire the components. Spawns the usage worker, so this must run
    /// inside a Tokio runtime.
    pub fn new(db: Surreal<Any>, tenancy: TenancyConfig, auth: AuthConfig) -> Self {
        let users = SurrealUserRepository::new(db.clone());
        let job_sites = SurrealJobSiteRepository::new(db.clone());
        let usage = SurrealUsageRepository::new(db.clone());
        let tracker = UsageTracker::spawn(usage.clone());

        Self(Arc::new(AppContext {
            resolver: TenantResolver::new(SurrealTenantRepository::new(db.clone()), tenancy.clone()),
            guard: TenantGuard::new(tenancy.clone()),
            quotas: QuotaEnforcer::new(users.clone(), job_sites.clone(), tenancy.quota_defaults),
            entitlements: EntitlementService::new(
                SurrealServiceRepository::new(db),
                usage,
                tracker.clone(),
            ),
            users,
            job_sites,
            tracker,
            auth,
        }))
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &AppContext {
        &self.0
    }
}

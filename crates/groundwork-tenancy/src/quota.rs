//! Plan quota enforcement.
//!
//! Counts are read and compared without any lock, so two concurrent
//! creations that both observe `current = max - 1` can each pass and
//! leave the tenant one over its ceiling. That overshoot is accepted.

use groundwork_core::models::tenant::{ResourceKind, Tenant};
use groundwork_core::repository::{JobSiteRepository, UserRepository};
use serde::Serialize;

use crate::config::QuotaDefaults;
use crate::error::TenancyError;

/// Current usage of one resource kind against its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub resource: ResourceKind,
    pub current: u64,
    pub max: u64,
}

impl QuotaStatus {
    pub fn remaining(&self) -> u64 {
        self.max.saturating_sub(self.current)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current >= self.max
    }
}

pub struct QuotaEnforcer<U: UserRepository, J: JobSiteRepository> {
    users: U,
    job_sites: J,
    defaults: QuotaDefaults,
}

impl<U: UserRepository, J: JobSiteRepository> QuotaEnforcer<U, J> {
    pub fn new(users: U, job_sites: J, defaults: QuotaDefaults) -> Self {
        Self {
            users,
            job_sites,
            defaults,
        }
    }

    /// Ceiling for `kind`: the tenant's own limit, else the default.
    pub fn ceiling(&self, tenant: &Tenant, kind: ResourceKind) -> u64 {
        tenant
            .limits
            .ceiling(kind)
            .unwrap_or_else(|| self.defaults.for_kind(kind))
    }

    pub async fn current(&self, tenant: &Tenant, kind: ResourceKind) -> Result<u64, TenancyError> {
        let tenant_id = tenant.id;
        match kind {
            ResourceKind::Users => self
                .users
                .count_active_by_tenant(tenant_id)
                .await
                .map_err(TenancyError::storage("count_active_users", Some(tenant_id))),
            ResourceKind::JobSites => self
                .job_sites
                .count_by_tenant(tenant_id)
                .await
                .map_err(TenancyError::storage("count_job_sites", Some(tenant_id))),
            ResourceKind::Clients => self
                .users
                .count_active_clients_by_tenant(tenant_id)
                .await
                .map_err(TenancyError::storage("count_active_clients", Some(tenant_id))),
            ResourceKind::Storage => Ok(tenant.storage_used_mb),
        }
    }

    pub async fn status(
        &self,
        tenant: &Tenant,
        kind: ResourceKind,
    ) -> Result<QuotaStatus, TenancyError> {
        Ok(QuotaStatus {
            resource: kind,
            current: self.current(tenant, kind).await?,
            max: self.ceiling(tenant, kind),
        })
    }

    /// Fail with `QuotaExceeded` when one more `kind` would not fit.
    pub async fn check(
        &self,
        tenant: &Tenant,
        kind: ResourceKind,
    ) -> Result<QuotaStatus, TenancyError> {
        let status = self.status(tenant, kind).await?;
        if status.is_exhausted() {
            return Err(TenancyError::QuotaExceeded {
                resource: kind,
                current: status.current,
                max: status.max,
            });
        }
        Ok(status)
    }

    /// Status of every resource kind.
    pub async fn summary(&self, tenant: &Tenant) -> Result<Vec<QuotaStatus>, TenancyError> {
        let mut statuses = Vec::with_capacity(ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            statuses.push(self.status(tenant, kind).await?);
        }
        Ok(statuses)
    }
}

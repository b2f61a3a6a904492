//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! require a `tenant_id` parameter to enforce data isolation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GroundworkResult;
use crate::models::{
    job_site::{CreateJobSite, JobSite},
    service::{CreateServiceDefinition, ServiceDefinition, ServiceEntitlement, UpsertEntitlement},
    tenant::{CreateTenant, Tenant, UpdateTenant},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenants (global scope)
// ---------------------------------------------------------------------------

/// Tenant lookups return tenants in any status; callers decide what a
/// suspended tenant means for them.
pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = GroundworkResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GroundworkResult<Tenant>> + Send;
    fn find_by_id(&self, id: Uuid) -> impl Future<Output = GroundworkResult<Option<Tenant>>> + Send;
    fn find_by_subdomain(
        &self,
        subdomain: &str,
    ) -> impl Future<Output = GroundworkResult<Option<Tenant>>> + Send;
    /// Resolve the value of an explicit tenant header: a tenant UUID or,
    /// failing that, a subdomain.
    fn find_by_header(
        &self,
        value: &str,
    ) -> impl Future<Output = GroundworkResult<Option<Tenant>>> + Send;
    /// Oldest tenant in storage.
    fn first(&self) -> impl Future<Output = GroundworkResult<Option<Tenant>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = GroundworkResult<Tenant>> + Send;
    fn suspend(&self, id: Uuid) -> impl Future<Output = GroundworkResult<Tenant>> + Send;
    fn reactivate(&self, id: Uuid) -> impl Future<Output = GroundworkResult<Tenant>> + Send;
    /// Add `delta_mb` (may be negative) to the storage counter, clamped at 0.
    fn adjust_storage_usage(
        &self,
        id: Uuid,
        delta_mb: i64,
    ) -> impl Future<Output = GroundworkResult<Tenant>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GroundworkResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = GroundworkResult<User>> + Send;
    /// Users are looked up by id alone: the tenant binding of the
    /// returned user is what the tenancy guard verifies.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GroundworkResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = GroundworkResult<User>> + Send;
    /// Users of the tenant with status `Active` or unset.
    fn count_active_by_tenant(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = GroundworkResult<u64>> + Send;
    /// Users of the tenant with role `client` and status `Active` or unset.
    fn count_active_clients_by_tenant(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = GroundworkResult<u64>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = GroundworkResult<PaginatedResult<User>>> + Send;
}

pub trait JobSiteRepository: Send + Sync {
    fn create(&self, input: CreateJobSite)
    -> impl Future<Output = GroundworkResult<JobSite>> + Send;
    /// All job sites of the tenant, regardless of status.
    fn count_by_tenant(&self, tenant_id: Uuid) -> impl Future<Output = GroundworkResult<u64>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = GroundworkResult<PaginatedResult<JobSite>>> + Send;
}

// ---------------------------------------------------------------------------
// Service catalog and entitlements
// ---------------------------------------------------------------------------

pub trait ServiceRepository: Send + Sync {
    fn create_definition(
        &self,
        input: CreateServiceDefinition,
    ) -> impl Future<Output = GroundworkResult<ServiceDefinition>> + Send;
    fn get_definition(
        &self,
        name: &str,
    ) -> impl Future<Output = GroundworkResult<Option<ServiceDefinition>>> + Send;
    /// Catalog ordered by `sort_order`.
    fn list_definitions(&self)
    -> impl Future<Output = GroundworkResult<Vec<ServiceDefinition>>> + Send;
    fn find_entitlement(
        &self,
        tenant_id: Uuid,
        service_name: &str,
    ) -> impl Future<Output = GroundworkResult<Option<ServiceEntitlement>>> + Send;
    fn list_enabled(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = GroundworkResult<Vec<ServiceEntitlement>>> + Send;
    /// Insert or update the single row for (tenant, service).
    fn upsert_entitlement(
        &self,
        input: UpsertEntitlement,
    ) -> impl Future<Output = GroundworkResult<ServiceEntitlement>> + Send;
}

pub trait UsageRepository: Send + Sync {
    /// Atomically add one call to the (tenant, service, day) counter,
    /// creating it if needed. Returns the new count.
    fn increment_usage(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
        day: NaiveDate,
    ) -> impl Future<Output = GroundworkResult<u64>> + Send;
    /// Current count, 0 when no row exists.
    fn get_usage(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
        day: NaiveDate,
    ) -> impl Future<Output = GroundworkResult<u64>> + Send;
}

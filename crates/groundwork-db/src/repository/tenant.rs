//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use groundwork_core::error::GroundworkResult;
use groundwork_core::models::tenant::{
    CreateTenant, Tenant, TenantLimits, TenantStatus, UpdateTenant, validate_subdomain,
};
use groundwork_core::repository::{PaginatedResult, Pagination, TenantRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::retry::with_retry;

/// DB-side row struct for statements where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    subdomain: String,
    owner_email: String,
    owner_name: String,
    plan: String,
    status: String,
    max_users: Option<u64>,
    max_job_sites: Option<u64>,
    max_clients: Option<u64>,
    max_storage_mb: Option<u64>,
    storage_used_mb: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, DbError> {
        let plan = self
            .plan
            .parse()
            .map_err(|e| DbError::Conversion(format!("tenant {id}: {e}")))?;
        let status = self
            .status
            .parse()
            .map_err(|e| DbError::Conversion(format!("tenant {id}: {e}")))?;
        Ok(Tenant {
            id,
            name: self.name,
            subdomain: self.subdomain,
            owner_email: self.owner_email,
            owner_name: self.owner_name,
            plan,
            status,
            limits: TenantLimits {
                max_users: self.max_users,
                max_job_sites: self.max_job_sites,
                max_clients: self.max_clients,
                max_storage_mb: self.max_storage_mb,
            },
            storage_used_mb: self.storage_used_mb,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    name: String,
    subdomain: String,
    owner_email: String,
    owner_name: String,
    plan: String,
    status: String,
    max_users: Option<u64>,
    max_job_sites: Option<u64>,
    max_clients: Option<u64>,
    max_storage_mb: Option<u64>,
    storage_used_mb: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Conversion(format!("invalid UUID: {e}")))?;
        TenantRow {
            name: self.name,
            subdomain: self.subdomain,
            owner_email: self.owner_email,
            owner_name: self.owner_name,
            plan: self.plan,
            status: self.status,
            max_users: self.max_users,
            max_job_sites: self.max_job_sites,
            max_clients: self.max_clients,
            max_storage_mb: self.max_storage_mb,
            storage_used_mb: self.storage_used_mb,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_tenant(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

const SELECT_TENANT: &str = "SELECT meta::id(id) AS record_id, * FROM";

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Run a `SELECT` that yields at most one tenant row.
    async fn fetch_one(
        &self,
        query: String,
        binds: Vec<(&'static str, String)>,
    ) -> Result<Option<Tenant>, DbError> {
        let mut builder = self.db.query(query);
        for bind in binds {
            builder = builder.bind(bind);
        }

        let mut result = builder.await?;
        let rows: Vec<TenantRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(TenantRowWithId::try_into_tenant)
            .transpose()
    }

    /// Insert a new tenant row. The subdomain index turns a concurrent
    /// duplicate into [`DbError::AlreadyExists`].
    async fn insert(&self, id: Uuid, input: CreateTenant) -> Result<Tenant, DbError> {
        let id_str = id.to_string();
        let entity = format!("tenant with subdomain {}", input.subdomain);

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, subdomain = $subdomain, \
                 owner_email = $owner_email, owner_name = $owner_name, \
                 plan = $plan, status = 'active', \
                 max_users = $max_users, max_job_sites = $max_job_sites, \
                 max_clients = $max_clients, max_storage_mb = $max_storage_mb, \
                 storage_used_mb = 0",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("subdomain", input.subdomain))
            .bind(("owner_email", input.owner_email))
            .bind(("owner_name", input.owner_name))
            .bind(("plan", input.plan.as_str().to_string()))
            .bind(("max_users", input.limits.max_users))
            .bind(("max_job_sites", input.limits.max_job_sites))
            .bind(("max_clients", input.limits.max_clients))
            .bind(("max_storage_mb", input.limits.max_storage_mb))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(e, entity))?;

        let rows: Vec<TenantRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        row.into_tenant(id)
    }

    async fn set_status(&self, id: Uuid, status: TenantStatus) -> GroundworkResult<Tenant> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> GroundworkResult<Tenant> {
        validate_subdomain(&input.subdomain)?;

        if self.find_by_subdomain(&input.subdomain).await?.is_some() {
            return Err(DbError::AlreadyExists {
                entity: format!("tenant with subdomain {}", input.subdomain),
            }
            .into());
        }

        let id = Uuid::new_v4();
        Ok(with_retry("create_tenant", || self.insert(id, input.clone())).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> GroundworkResult<Tenant> {
        let tenant = self.find_by_id(id).await?;
        Ok(tenant.ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?)
    }

    async fn find_by_id(&self, id: Uuid) -> GroundworkResult<Option<Tenant>> {
        Ok(self
            .fetch_one(
                format!("{SELECT_TENANT} type::record('tenant', $id)"),
                vec![("id", id.to_string())],
            )
            .await?)
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> GroundworkResult<Option<Tenant>> {
        Ok(self
            .fetch_one(
                format!("{SELECT_TENANT} tenant WHERE subdomain = $subdomain LIMIT 1"),
                vec![("subdomain", subdomain.to_string())],
            )
            .await?)
    }

    async fn find_by_header(&self, value: &str) -> GroundworkResult<Option<Tenant>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }

        if let Ok(id) = Uuid::parse_str(value) {
            if let Some(tenant) = self.find_by_id(id).await? {
                return Ok(Some(tenant));
            }
        }

        self.find_by_subdomain(&value.to_ascii_lowercase()).await
    }

    async fn first(&self) -> GroundworkResult<Option<Tenant>> {
        Ok(self
            .fetch_one(
                format!("{SELECT_TENANT} tenant ORDER BY created_at ASC LIMIT 1"),
                Vec::new(),
            )
            .await?)
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> GroundworkResult<Tenant> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.owner_email.is_some() {
            sets.push("owner_email = $owner_email");
        }
        if input.owner_name.is_some() {
            sets.push("owner_name = $owner_name");
        }
        if input.plan.is_some() {
            sets.push("plan = $plan");
        }
        if input.limits.is_some() {
            sets.push(
                "max_users = $max_users, max_job_sites = $max_job_sites, \
                 max_clients = $max_clients, max_storage_mb = $max_storage_mb",
            );
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('tenant', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(owner_email) = input.owner_email {
            builder = builder.bind(("owner_email", owner_email));
        }
        if let Some(owner_name) = input.owner_name {
            builder = builder.bind(("owner_name", owner_name));
        }
        if let Some(plan) = input.plan {
            builder = builder.bind(("plan", plan.as_str().to_string()));
        }
        if let Some(limits) = input.limits {
            builder = builder
                .bind(("max_users", limits.max_users))
                .bind(("max_job_sites", limits.max_job_sites))
                .bind(("max_clients", limits.max_clients))
                .bind(("max_storage_mb", limits.max_storage_mb));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn suspend(&self, id: Uuid) -> GroundworkResult<Tenant> {
        self.set_status(id, TenantStatus::Suspended).await
    }

    async fn reactivate(&self, id: Uuid) -> GroundworkResult<Tenant> {
        self.set_status(id, TenantStatus::Active).await
    }

    async fn adjust_storage_usage(&self, id: Uuid, delta_mb: i64) -> GroundworkResult<Tenant> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 storage_used_mb = math::max([0, storage_used_mb + $delta]), \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("delta", delta_mb))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn list(&self, pagination: Pagination) -> GroundworkResult<PaginatedResult<Tenant>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM tenant GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

//! SurrealDB implementation of [`JobSiteRepository`].

use chrono::{DateTime, Utc};
use groundwork_core::error::GroundworkResult;
use groundwork_core::models::job_site::{CreateJobSite, JobSite};
use groundwork_core::repository::{JobSiteRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct JobSiteRow {
    tenant_id: String,
    name: String,
    address: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct JobSiteRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    address: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl JobSiteRow {
    fn into_job_site(self, id: Uuid) -> Result<JobSite, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Conversion(format!("invalid tenant UUID: {e}")))?;
        Ok(JobSite {
            id,
            tenant_id,
            name: self.name,
            address: self.address,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl JobSiteRowWithId {
    fn try_into_job_site(self) -> Result<JobSite, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Conversion(format!("invalid UUID: {e}")))?;
        JobSiteRow {
            tenant_id: self.tenant_id,
            name: self.name,
            address: self.address,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_job_site(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the JobSite repository.
#[derive(Clone)]
pub struct SurrealJobSiteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealJobSiteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> JobSiteRepository for SurrealJobSiteRepository<C> {
    async fn create(&self, input: CreateJobSite) -> GroundworkResult<JobSite> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('job_site', $id) SET \
                 tenant_id = $tenant_id, name = $name, \
                 address = $address, status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("address", input.address))
            .bind(("status", input.status.unwrap_or_else(|| "planned".into())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<JobSiteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "job_site".into(),
            id: id_str,
        })?;

        Ok(row.into_job_site(id)?)
    }

    async fn count_by_tenant(&self, tenant_id: Uuid) -> GroundworkResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM job_site \
                 WHERE tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> GroundworkResult<PaginatedResult<JobSite>> {
        let total = self.count_by_tenant(tenant_id).await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM job_site \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<JobSiteRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_job_site())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

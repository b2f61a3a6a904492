//! SurrealDB implementation of [`UsageRepository`].
//!
//! Counters live at `service_usage:<tenant>_<service>_<day>`. The
//! increment is a single `UPSERT ... SET call_count += 1` statement, so
//! there is no read-modify-write in application code. Concurrent
//! increments of one counter conflict in the database; the loser is
//! retried until it applies.

use chrono::NaiveDate;
use groundwork_core::error::GroundworkResult;
use groundwork_core::repository::UsageRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::retry::with_retry;

#[derive(Debug, SurrealValue)]
struct UsageRow {
    call_count: u64,
}

fn usage_key(tenant_id: Uuid, service_id: Uuid, day: NaiveDate) -> String {
    format!("{tenant_id}_{service_id}_{}", day.format("%Y-%m-%d"))
}

#[derive(Clone)]
pub struct SurrealUsageRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUsageRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn increment_once(
        &self,
        key: &str,
        tenant_id: Uuid,
        service_id: Uuid,
        day: &str,
    ) -> Result<u64, DbError> {
        let result = self
            .db
            .query(
                "UPSERT type::record('service_usage', $key) SET \
                 tenant_id = $tenant_id, service_id = $service_id, \
                 day = $day, call_count += 1, last_used_at = time::now()",
            )
            .bind(("key", key.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("service_id", service_id.to_string()))
            .bind(("day", day.to_string()))
            .await?;

        let mut result = result.check().map_err(|e| match DbError::statement(e, "service_usage") {
            // A concurrent first increment created the counter; run again to update it.
            DbError::AlreadyExists { entity } => DbError::Conflict(format!("{entity} created concurrently")),
            other => other,
        })?;

        let rows: Vec<UsageRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service_usage".into(),
            id: key.to_string(),
        })?;

        Ok(row.call_count)
    }
}

impl<C: Connection> UsageRepository for SurrealUsageRepository<C> {
    async fn increment_usage(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
        day: NaiveDate,
    ) -> GroundworkResult<u64> {
        let key = usage_key(tenant_id, service_id, day);
        let day = day.format("%Y-%m-%d").to_string();

        Ok(with_retry("increment_usage", || {
            self.increment_once(&key, tenant_id, service_id, &day)
        })
        .await?)
    }

    async fn get_usage(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
        day: NaiveDate,
    ) -> GroundworkResult<u64> {
        let mut result = self
            .db
            .query("SELECT call_count FROM type::record('service_usage', $key)")
            .bind(("key", usage_key(tenant_id, service_id, day)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UsageRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.call_count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_key_is_per_day() {
        let tenant = Uuid::nil();
        let service = Uuid::from_u128(1);
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let tuesday = monday.succ_opt().unwrap();

        assert_ne!(
            usage_key(tenant, service, monday),
            usage_key(tenant, service, tuesday)
        );
        assert!(usage_key(tenant, service, monday).ends_with("_2026-03-02"));
    }
}

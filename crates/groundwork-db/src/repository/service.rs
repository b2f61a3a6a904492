//! SurrealDB implementation of [`ServiceRepository`].
//!
//! Entitlement rows are keyed `service_entitlement:<tenant>_<service>`,
//! so an `UPSERT` on that record id can never produce a second row for
//! the same pair.

use chrono::{DateTime, Utc};
use groundwork_core::error::GroundworkResult;
use groundwork_core::models::service::{
    CreateServiceDefinition, ServiceDefinition, ServiceEntitlement, UpsertEntitlement,
};
use groundwork_core::repository::ServiceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct DefinitionRow {
    name: String,
    display_name: String,
    description: String,
    sort_order: u32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DefinitionRowWithId {
    record_id: String,
    name: String,
    display_name: String,
    description: String,
    sort_order: u32,
    created_at: DateTime<Utc>,
}

impl DefinitionRow {
    fn into_definition(self, id: Uuid) -> ServiceDefinition {
        ServiceDefinition {
            id,
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            sort_order: self.sort_order,
            created_at: self.created_at,
        }
    }
}

impl DefinitionRowWithId {
    fn try_into_definition(self) -> Result<ServiceDefinition, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Conversion(format!("invalid UUID: {e}")))?;
        Ok(ServiceDefinition {
            id,
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            sort_order: self.sort_order,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct EntitlementRow {
    tenant_id: String,
    service_id: String,
    service_name: String,
    enabled: bool,
    enabled_at: Option<DateTime<Utc>>,
    disabled_at: Option<DateTime<Utc>>,
    settings: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EntitlementRow {
    fn try_into_entitlement(self) -> Result<ServiceEntitlement, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Conversion(format!("invalid tenant UUID: {e}")))?;
        let service_id = Uuid::parse_str(&self.service_id)
            .map_err(|e| DbError::Conversion(format!("invalid service UUID: {e}")))?;
        Ok(ServiceEntitlement {
            tenant_id,
            service_id,
            service_name: self.service_name,
            enabled: self.enabled,
            enabled_at: self.enabled_at,
            disabled_at: self.disabled_at,
            settings: self.settings,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn entitlement_key(tenant_id: Uuid, service_id: Uuid) -> String {
    format!("{tenant_id}_{service_id}")
}

/// SurrealDB implementation of the service catalog and entitlements.
#[derive(Clone)]
pub struct SurrealServiceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealServiceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ServiceRepository for SurrealServiceRepository<C> {
    async fn create_definition(
        &self,
        input: CreateServiceDefinition,
    ) -> GroundworkResult<ServiceDefinition> {
        if self.get_definition(&input.name).await?.is_some() {
            return Err(DbError::AlreadyExists {
                entity: format!("service {}", input.name),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let entity = format!("service {}", input.name);

        let result = self
            .db
            .query(
                "CREATE type::record('service_definition', $id) SET \
                 name = $name, display_name = $display_name, \
                 description = $description, sort_order = $sort_order",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("display_name", input.display_name))
            .bind(("description", input.description))
            .bind(("sort_order", input.sort_order))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(e, entity))?;

        let rows: Vec<DefinitionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service_definition".into(),
            id: id_str,
        })?;

        Ok(row.into_definition(id))
    }

    async fn get_definition(&self, name: &str) -> GroundworkResult<Option<ServiceDefinition>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service_definition \
                 WHERE name = $name LIMIT 1",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DefinitionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(DefinitionRowWithId::try_into_definition)
            .transpose()?)
    }

    async fn list_definitions(&self) -> GroundworkResult<Vec<ServiceDefinition>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service_definition \
                 ORDER BY sort_order ASC, name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DefinitionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_definition())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn find_entitlement(
        &self,
        tenant_id: Uuid,
        service_name: &str,
    ) -> GroundworkResult<Option<ServiceEntitlement>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM service_entitlement \
                 WHERE tenant_id = $tenant_id AND service_name = $service_name \
                 LIMIT 1",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("service_name", service_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EntitlementRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(EntitlementRow::try_into_entitlement)
            .transpose()?)
    }

    async fn list_enabled(&self, tenant_id: Uuid) -> GroundworkResult<Vec<ServiceEntitlement>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM service_entitlement \
                 WHERE tenant_id = $tenant_id AND enabled = true \
                 ORDER BY service_name ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EntitlementRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_entitlement())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn upsert_entitlement(
        &self,
        input: UpsertEntitlement,
    ) -> GroundworkResult<ServiceEntitlement> {
        let key = entitlement_key(input.tenant_id, input.service_id);

        let mut sets = vec![
            "tenant_id = $tenant_id",
            "service_id = $service_id",
            "service_name = $service_name",
            "enabled = $enabled",
            "updated_at = time::now()",
        ];
        // Only the timestamp of the transition being made is touched.
        if input.enabled {
            sets.push("enabled_at = time::now()");
        } else {
            sets.push("disabled_at = time::now()");
        }
        if input.settings.is_some() {
            sets.push("settings = $settings");
        }

        let query = format!(
            "UPSERT type::record('service_entitlement', $key) SET {}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("key", key.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("service_id", input.service_id.to_string()))
            .bind(("service_name", input.service_name))
            .bind(("enabled", input.enabled));

        if let Some(settings) = input.settings {
            builder = builder.bind(("settings", settings));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<EntitlementRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service_entitlement".into(),
            id: key,
        })?;

        Ok(row.try_into_entitlement()?)
    }
}

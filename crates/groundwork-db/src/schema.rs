//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings, including record keys. Enums are stored
//! as strings, with ASSERT constraints where the set is closed.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "seed_service_catalog",
        sql: SEED_SERVICE_CATALOG,
    },
];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD subdomain ON TABLE tenant TYPE string;
DEFINE FIELD owner_email ON TABLE tenant TYPE string;
DEFINE FIELD owner_name ON TABLE tenant TYPE string;
DEFINE FIELD plan ON TABLE tenant TYPE string \
    ASSERT $value IN ['starter', 'professional', 'enterprise'];
DEFINE FIELD status ON TABLE tenant TYPE string \
    ASSERT $value IN ['active', 'suspended'];
DEFINE FIELD max_users ON TABLE tenant TYPE option<int>;
DEFINE FIELD max_job_sites ON TABLE tenant TYPE option<int>;
DEFINE FIELD max_clients ON TABLE tenant TYPE option<int>;
DEFINE FIELD max_storage_mb ON TABLE tenant TYPE option<int>;
DEFINE FIELD storage_used_mb ON TABLE tenant TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_subdomain ON TABLE tenant \
    COLUMNS subdomain UNIQUE;

-- =======================================================================
-- Users (tenant scope; tenant_id and status unset on legacy rows)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE user TYPE option<string>;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string;
DEFINE FIELD status ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_tenant_username ON TABLE user \
    COLUMNS tenant_id, username UNIQUE;
DEFINE INDEX idx_user_tenant_email ON TABLE user \
    COLUMNS tenant_id, email UNIQUE;

-- =======================================================================
-- Job sites (tenant scope)
-- =======================================================================
DEFINE TABLE job_site SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE job_site TYPE string;
DEFINE FIELD name ON TABLE job_site TYPE string;
DEFINE FIELD address ON TABLE job_site TYPE option<string>;
DEFINE FIELD status ON TABLE job_site TYPE string DEFAULT 'planned';
DEFINE FIELD created_at ON TABLE job_site TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE job_site TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_job_site_tenant ON TABLE job_site COLUMNS tenant_id;

-- =======================================================================
-- Service catalog (global scope)
-- =======================================================================
DEFINE TABLE service_definition SCHEMAFULL;
DEFINE FIELD name ON TABLE service_definition TYPE string;
DEFINE FIELD display_name ON TABLE service_definition TYPE string;
DEFINE FIELD description ON TABLE service_definition TYPE string;
DEFINE FIELD sort_order ON TABLE service_definition TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE service_definition TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_service_definition_name ON TABLE service_definition \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Service entitlements (tenant scope, one row per tenant + service)
-- =======================================================================
DEFINE TABLE service_entitlement SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE service_entitlement TYPE string;
DEFINE FIELD service_id ON TABLE service_entitlement TYPE string;
DEFINE FIELD service_name ON TABLE service_entitlement TYPE string;
DEFINE FIELD enabled ON TABLE service_entitlement TYPE bool \
    DEFAULT false;
DEFINE FIELD enabled_at ON TABLE service_entitlement \
    TYPE option<datetime>;
DEFINE FIELD disabled_at ON TABLE service_entitlement \
    TYPE option<datetime>;
DEFINE FIELD settings ON TABLE service_entitlement TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE service_entitlement TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE service_entitlement TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_entitlement_tenant_service ON TABLE service_entitlement \
    COLUMNS tenant_id, service_id UNIQUE;

-- =======================================================================
-- Service usage (tenant scope, one row per tenant + service + day)
-- =======================================================================
DEFINE TABLE service_usage SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE service_usage TYPE string;
DEFINE FIELD service_id ON TABLE service_usage TYPE string;
DEFINE FIELD day ON TABLE service_usage TYPE string;
DEFINE FIELD call_count ON TABLE service_usage TYPE int DEFAULT 0;
DEFINE FIELD last_used_at ON TABLE service_usage TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_usage_tenant_service_day ON TABLE service_usage \
    COLUMNS tenant_id, service_id, day UNIQUE;
";

// -----------------------------------------------------------------------
// Migration v2: default service catalog
// -----------------------------------------------------------------------

const SEED_SERVICE_CATALOG: &str = "\
CREATE type::record('service_definition', <string> rand::uuid::v4()) SET \
    name = 'crm_sync', display_name = 'CRM Sync', \
    description = 'Keep clients and jobs in sync with your CRM.', \
    sort_order = 10;
CREATE type::record('service_definition', <string> rand::uuid::v4()) SET \
    name = 'sms_notifications', display_name = 'SMS Notifications', \
    description = 'Text message alerts for appointments and expiring documents.', \
    sort_order = 20;
CREATE type::record('service_definition', <string> rand::uuid::v4()) SET \
    name = 'email_notifications', display_name = 'Email Notifications', \
    description = 'Transactional email for invoices, contracts and reminders.', \
    sort_order = 30;
CREATE type::record('service_definition', <string> rand::uuid::v4()) SET \
    name = 'calendar_scheduling', display_name = 'Calendar Scheduling', \
    description = 'Book site visits and appointments through your calendar.', \
    sort_order = 40;
CREATE type::record('service_definition', <string> rand::uuid::v4()) SET \
    name = 'e_signatures', display_name = 'E-Signatures', \
    description = 'Send generated contracts out for electronic signature.', \
    sort_order = 50;
CREATE type::record('service_definition', <string> rand::uuid::v4()) SET \
    name = 'document_expiry_alerts', display_name = 'Document Expiry Alerts', \
    description = 'Track licence and insurance expiry dates for subcontractors.', \
    sort_order = 60;
CREATE type::record('service_definition', <string> rand::uuid::v4()) SET \
    name = 'invoicing', display_name = 'Invoicing', \
    description = 'Create, send and track invoices.', \
    sort_order = 70;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner (and therefore the catalog seed).
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn catalog_seed_follows_schema() {
        let seed = MIGRATIONS
            .iter()
            .find(|m| m.name == "seed_service_catalog")
            .unwrap();
        assert!(seed.version > 1);
        assert!(seed.sql.contains("crm_sync"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}

//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use groundwork_core::error::GroundworkResult;
use groundwork_core::models::role::Role;
use groundwork_core::models::user::{CreateUser, UpdateUser, User, UserStatus};
use groundwork_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    tenant_id: Option<String>,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    tenant_id: Option<String>,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: Option<&str>) -> Result<Option<UserStatus>, DbError> {
    s.map(|s| s.parse().map_err(|e| DbError::Conversion(format!("{e}"))))
        .transpose()
}

fn parse_tenant_id(s: Option<&str>) -> Result<Option<Uuid>, DbError> {
    s.map(|s| {
        Uuid::parse_str(s).map_err(|e| DbError::Conversion(format!("invalid tenant UUID: {e}")))
    })
    .transpose()
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            tenant_id: parse_tenant_id(self.tenant_id.as_deref())?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            status: parse_status(self.status.as_deref())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Conversion(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            tenant_id: parse_tenant_id(self.tenant_id.as_deref())?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            status: parse_status(self.status.as_deref())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
/// The salt is randomly generated for each call.
fn hash_password(password: &str) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::PasswordHash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn count(&self, query: &str, tenant_id: Uuid) -> GroundworkResult<u64> {
        let mut result = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("client", Role::Client.as_str().to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> GroundworkResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = hash_password(&input.password)?;
        let entity = format!("user {}", input.username);

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 tenant_id = $tenant_id, \
                 username = $username, email = $email, \
                 password_hash = $password_hash, \
                 role = $role, status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.map(|t| t.to_string())))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("role", input.role))
            .bind(("status", input.status.map(|s| s.as_str().to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement(e, entity))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GroundworkResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> GroundworkResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.tenant_id.is_some() {
            sets.push("tenant_id = $tenant_id");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('user', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(tenant_id) = input.tenant_id {
            builder = builder.bind(("tenant_id", tenant_id.to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn count_active_by_tenant(&self, tenant_id: Uuid) -> GroundworkResult<u64> {
        self.count(
            "SELECT count() AS total FROM user \
             WHERE tenant_id = $tenant_id \
             AND (status = NONE OR status = 'Active') \
             GROUP ALL",
            tenant_id,
        )
        .await
    }

    async fn count_active_clients_by_tenant(&self, tenant_id: Uuid) -> GroundworkResult<u64> {
        self.count(
            "SELECT count() AS total FROM user \
             WHERE tenant_id = $tenant_id AND role = $client \
             AND (status = NONE OR status = 'Active') \
             GROUP ALL",
            tenant_id,
        )
        .await
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> GroundworkResult<PaginatedResult<User>> {
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

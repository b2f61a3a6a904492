//! Database-specific error types and conversions.

use groundwork_core::error::GroundworkError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Conversion(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Write conflict: {0}")]
    Conflict(String),
}

/// Substrings SurrealDB uses for write conflicts between concurrent
/// transactions. The losing statement may be run again.
const RETRYABLE_MARKERS: &[&str] = &[
    "Transaction conflict",
    "retry the transaction",
    "can be retried",
];

/// Substring of a unique-index violation.
const UNIQUE_VIOLATION_MARKER: &str = "already contains";

impl DbError {
    /// Classify the failure of a write statement against `entity`.
    /// Unique-index violations become [`DbError::AlreadyExists`], write
    /// conflicts [`DbError::Conflict`].
    pub(crate) fn statement(err: impl std::fmt::Display, entity: impl Into<String>) -> Self {
        let message = err.to_string();
        if message.contains(UNIQUE_VIOLATION_MARKER) {
            Self::AlreadyExists {
                entity: entity.into(),
            }
        } else if RETRYABLE_MARKERS.iter().any(|m| message.contains(m)) {
            Self::Conflict(message)
        } else {
            Self::Query(message)
        }
    }

    /// Whether the failure was a write conflict that a retry can resolve.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict(_) => true,
            Self::Surreal(e) => {
                let message = e.to_string();
                RETRYABLE_MARKERS.iter().any(|m| message.contains(m))
            }
            _ => false,
        }
    }
}

impl From<DbError> for GroundworkError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GroundworkError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => GroundworkError::AlreadyExists { entity },
            other => GroundworkError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_already_exists() {
        let err = DbError::statement(
            "Database index `idx_tenant_subdomain` already contains 'default', \
             with record `tenant:abc`",
            "tenant with subdomain default",
        );
        assert!(matches!(err, DbError::AlreadyExists { .. }));
        assert!(matches!(
            GroundworkError::from(err),
            GroundworkError::AlreadyExists { .. }
        ));
    }

    #[test]
    fn write_conflicts_are_retryable() {
        let err = DbError::statement(
            "Transaction conflict: Write conflict, retry the transaction",
            "service_usage",
        );
        assert!(matches!(err, DbError::Conflict(_)));
        assert!(err.is_retryable());

        let err = DbError::statement("Found 'x' for field `plan`", "tenant");
        assert!(matches!(err, DbError::Query(_)));
        assert!(!err.is_retryable());
        assert!(!DbError::Migration("Transaction conflict".into()).is_retryable());
    }
}

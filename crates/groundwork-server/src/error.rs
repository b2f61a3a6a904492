//! JSON failure responses.
//!
//! Every failure leaves the server as
//! `{ "error": <kind>, "message": <text>, ...context }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use groundwork_core::error::GroundworkError;
use groundwork_tenancy::TenancyError;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tenancy(#[from] TenancyError),

    #[error("{0}")]
    Validation(String),

    #[error("{entity} already exists")]
    Conflict { entity: String },
}

impl ApiError {
    /// Map a repository error raised outside the tenancy components.
    pub fn storage(
        operation: &'static str,
        tenant_id: Option<uuid::Uuid>,
    ) -> impl FnOnce(GroundworkError) -> Self {
        move |source| match source {
            GroundworkError::Validation { message } => Self::Validation(message),
            GroundworkError::AlreadyExists { entity } => Self::Conflict { entity },
            source => Self::Tenancy(TenancyError::Storage {
                operation,
                tenant_id,
                source,
            }),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Tenancy(e) => match e {
                TenancyError::TenantNotFound
                | TenancyError::ServiceNotFound { .. }
                | TenancyError::EntitlementNotFound { .. } => StatusCode::NOT_FOUND,
                TenancyError::TenantSuspended { .. }
                | TenancyError::AccessDenied { .. }
                | TenancyError::InsufficientPermissions { .. }
                | TenancyError::QuotaExceeded { .. }
                | TenancyError::ServiceNotEnabled { .. }
                | TenancyError::NoServiceEnabled { .. } => StatusCode::FORBIDDEN,
                TenancyError::Unauthenticated => StatusCode::UNAUTHORIZED,
                TenancyError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Tenancy(e) => e.kind(),
            Self::Validation(_) => "ValidationError",
            Self::Conflict { .. } => "AlreadyExists",
        }
    }

    fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".into(), self.kind().into());
        match self {
            Self::Tenancy(e) => {
                body.insert("message".into(), e.public_message().into());
                body.extend(e.details());
            }
            other => {
                body.insert("message".into(), other.to_string().into());
            }
        }
        Value::Object(body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Tenancy(TenancyError::Storage {
            operation,
            tenant_id,
            source,
        }) = &self
        {
            error!(operation, tenant_id = ?tenant_id, error = %source, "storage failure");
        }

        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use groundwork_core::models::tenant::ResourceKind;

    use super::*;

    #[test]
    fn quota_payload_has_upgrade_context() {
        let err = ApiError::from(TenancyError::QuotaExceeded {
            resource: ResourceKind::Users,
            current: 3,
            max: 3,
        });
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let body = err.body();
        assert_eq!(body["error"], "QuotaExceeded");
        assert_eq!(body["resource"], "users");
        assert_eq!(body["current"], 3);
        assert_eq!(body["max"], 3);
        assert!(body["message"].as_str().unwrap().contains("3/3"));
    }

    #[test]
    fn storage_failures_are_generic() {
        let err = ApiError::storage("create_user", None)(GroundworkError::Database(
            "socket closed".into(),
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body["error"], "InternalError");
        assert!(!body.to_string().contains("socket closed"));
    }

    #[test]
    fn validation_and_conflict_map_to_client_errors() {
        let err = ApiError::storage("create_user", None)(GroundworkError::Validation {
            message: "bad email".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::storage("create_user", None)(GroundworkError::AlreadyExists {
            entity: "user".into(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}

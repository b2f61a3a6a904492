//! Tenancy error types.
//!
//! Each variant maps to a stable `kind()` string that API clients match
//! on, plus optional context fields (see [`TenancyError::details`]).

use groundwork_core::error::GroundworkError;
use groundwork_core::models::tenant::ResourceKind;
use serde_json::{Map, Value, json};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("no tenant matches this request")]
    TenantNotFound,

    #[error("this account has been suspended")]
    TenantSuspended { tenant_id: Uuid },

    #[error("you do not have access to this organization")]
    AccessDenied {
        principal_tenant: Option<Uuid>,
        resolved_tenant: Uuid,
    },

    #[error("authentication required")]
    Unauthenticated,

    #[error("this action requires one of the roles: {}", allowed.join(", "))]
    InsufficientPermissions { allowed: Vec<String> },

    #[error("{resource} limit reached ({current}/{max}); upgrade your plan to add more")]
    QuotaExceeded {
        resource: ResourceKind,
        current: u64,
        max: u64,
    },

    #[error("{display_name} is not enabled for your account; enable it under Settings > Services")]
    ServiceNotEnabled {
        service: String,
        display_name: String,
    },

    #[error(
        "none of the required services are enabled ({}); enable one under Settings > Services",
        services.join(", ")
    )]
    NoServiceEnabled { services: Vec<String> },

    #[error("unknown service: {service}")]
    ServiceNotFound { service: String },

    /// Nothing to flip: the service was never enabled for the tenant.
    #[error("service {service} has never been enabled for this account")]
    EntitlementNotFound { service: String },

    #[error("storage failure during {operation}: {source}")]
    Storage {
        operation: &'static str,
        tenant_id: Option<Uuid>,
        #[source]
        source: GroundworkError,
    },
}

impl TenancyError {
    pub fn storage(
        operation: &'static str,
        tenant_id: Option<Uuid>,
    ) -> impl FnOnce(GroundworkError) -> Self {
        move |source| Self::Storage {
            operation,
            tenant_id,
            source,
        }
    }

    /// Stable identifier surfaced as the `error` field of failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TenantNotFound => "TenantNotFound",
            Self::TenantSuspended { .. } => "TenantSuspended",
            Self::AccessDenied { .. } => "AccessDenied",
            Self::Unauthenticated => "Unauthenticated",
            Self::InsufficientPermissions { .. } => "InsufficientPermissions",
            Self::QuotaExceeded { .. } => "QuotaExceeded",
            Self::ServiceNotEnabled { .. } | Self::NoServiceEnabled { .. } => "ServiceNotEnabled",
            Self::ServiceNotFound { .. } | Self::EntitlementNotFound { .. } => "ServiceNotFound",
            Self::Storage { .. } => "InternalError",
        }
    }

    /// Message safe to show to API clients. Storage details stay in logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Storage { .. } => "an internal error occurred".into(),
            other => other.to_string(),
        }
    }

    /// Context fields added to the failure payload next to `error` and
    /// `message`.
    pub fn details(&self) -> Map<String, Value> {
        let value = match self {
            Self::InsufficientPermissions { allowed } => json!({ "allowed": allowed }),
            Self::QuotaExceeded {
                resource,
                current,
                max,
            } => json!({ "resource": resource, "current": current, "max": max }),
            Self::ServiceNotEnabled {
                service,
                display_name,
            } => json!({ "service": service, "display_name": display_name }),
            Self::NoServiceEnabled { services } => json!({ "services": services }),
            Self::ServiceNotFound { service } | Self::EntitlementNotFound { service } => {
                json!({ "service": service })
            }
            _ => json!({}),
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_details_carry_counts() {
        let err = TenancyError::QuotaExceeded {
            resource: ResourceKind::JobSites,
            current: 25,
            max: 25,
        };
        let details = err.details();
        assert_eq!(err.kind(), "QuotaExceeded");
        assert_eq!(details["resource"], "job_sites");
        assert_eq!(details["current"], 25);
        assert_eq!(details["max"], 25);
    }

    #[test]
    fn any_service_failure_shares_the_single_service_kind() {
        let err = TenancyError::NoServiceEnabled {
            services: vec!["sms_notifications".into(), "email_notifications".into()],
        };
        assert_eq!(err.kind(), "ServiceNotEnabled");
        assert_eq!(err.details()["services"][1], "email_notifications");
    }

    #[test]
    fn storage_errors_are_not_leaked() {
        let err = TenancyError::storage("count_active_users", None)(GroundworkError::Database(
            "connection reset by peer".into(),
        ));
        assert_eq!(err.kind(), "InternalError");
        assert!(!err.public_message().contains("connection reset"));
        assert!(err.details().is_empty());
    }
}

//! Authorization checks that run after tenant resolution.

use groundwork_core::models::user::Principal;
use tracing::warn;
use uuid::Uuid;

use crate::config::TenancyConfig;
use crate::error::TenancyError;

/// Checks a principal against the resolved tenant and route roles.
#[derive(Debug, Clone)]
pub struct TenantGuard {
    config: TenancyConfig,
}

impl TenantGuard {
    pub fn new(config: TenancyConfig) -> Self {
        Self { config }
    }

    /// The principal must belong to the resolved tenant.
    ///
    /// A principal with no tenant is admitted only in single-tenant
    /// development mode.
    pub fn verify_membership(
        &self,
        principal: &Principal,
        resolved_tenant: Uuid,
    ) -> Result<(), TenancyError> {
        match principal.tenant_id {
            Some(tenant_id) if tenant_id == resolved_tenant => Ok(()),
            None if self.config.relaxed_mode() => Ok(()),
            principal_tenant => {
                warn!(
                    target: "security",
                    principal_id = %principal.id,
                    principal_tenant = ?principal_tenant,
                    resolved_tenant = %resolved_tenant,
                    "cross-tenant access denied"
                );
                Err(TenancyError::AccessDenied {
                    principal_tenant,
                    resolved_tenant,
                })
            }
        }
    }
}

/// Pass if the principal's canonical role, or its raw stored role, is in
/// `allowed`.
pub fn require_role(principal: &Principal, allowed: &[&str]) -> Result<(), TenancyError> {
    let canonical = principal.canonical_role();
    let permitted = allowed.iter().any(|name| {
        canonical.is_some_and(|role| role.as_str() == *name) || principal.role == *name
    });

    if permitted {
        Ok(())
    } else {
        Err(TenancyError::InsufficientPermissions {
            allowed: allowed.iter().map(|name| name.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use groundwork_core::models::user::UserStatus;

    use super::*;
    use crate::config::Environment;

    fn principal(tenant_id: Option<Uuid>, role: &str) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            tenant_id,
            role: role.into(),
            status: Some(UserStatus::Active),
        }
    }

    #[test]
    fn legacy_admin_passes_tenant_admin_routes() {
        let p = principal(None, "admin");
        assert!(require_role(&p, &["tenant_admin"]).is_ok());
    }

    #[test]
    fn raw_role_is_also_accepted() {
        let p = principal(None, "admin");
        assert!(require_role(&p, &["admin"]).is_ok());

        let p = principal(None, "estimator");
        assert!(require_role(&p, &["estimator", "tenant_admin"]).is_ok());
    }

    #[test]
    fn other_roles_are_rejected_with_the_allowed_list() {
        let p = principal(None, "client");
        match require_role(&p, &["tenant_admin", "subcontractor"]) {
            Err(TenancyError::InsufficientPermissions { allowed }) => {
                assert_eq!(allowed, vec!["tenant_admin", "subcontractor"]);
            }
            other => panic!("expected InsufficientPermissions, got {other:?}"),
        }
    }

    #[test]
    fn foreign_tenant_is_denied() {
        let guard = TenantGuard::new(TenancyConfig::default());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(guard.verify_membership(&principal(Some(a), "client"), a).is_ok());
        assert!(matches!(
            guard.verify_membership(&principal(Some(a), "client"), b),
            Err(TenancyError::AccessDenied { principal_tenant: Some(t), resolved_tenant })
                if t == a && resolved_tenant == b
        ));
    }

    #[test]
    fn tenantless_principal_only_in_single_tenant_development() {
        let tenant = Uuid::new_v4();
        let p = principal(None, "tenant_admin");

        let strict = TenantGuard::new(TenancyConfig::default());
        assert!(strict.verify_membership(&p, tenant).is_err());

        let relaxed = TenantGuard::new(TenancyConfig {
            single_tenant_mode: true,
            environment: Environment::Development,
            ..Default::default()
        });
        assert!(relaxed.verify_membership(&p, tenant).is_ok());

        let production = TenantGuard::new(TenancyConfig {
            single_tenant_mode: true,
            environment: Environment::Production,
            ..Default::default()
        });
        assert!(production.verify_membership(&p, tenant).is_err());
    }
}

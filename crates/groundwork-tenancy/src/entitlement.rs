//! Per-tenant service entitlements and the service gates built on them.

use chrono::NaiveDate;
use groundwork_core::models::service::{ServiceDefinition, ServiceEntitlement, UpsertEntitlement};
use groundwork_core::repository::{ServiceRepository, UsageRepository};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::TenancyError;
use crate::usage::UsageTracker;

/// Outcome of an entitlement mutation.
#[derive(Debug, Clone)]
pub enum EntitlementChange {
    /// The stored flag was flipped (or the row created).
    Changed(ServiceEntitlement),
    /// The row already had the requested state.
    Unchanged(ServiceEntitlement),
    /// No row existed, so there was nothing to disable.
    Absent,
}

impl EntitlementChange {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn entitlement(&self) -> Option<&ServiceEntitlement> {
        match self {
            Self::Changed(e) | Self::Unchanged(e) => Some(e),
            Self::Absent => None,
        }
    }
}

/// Entitlement store and service gates.
///
/// Reads go straight to the repository. Usage of a granted service is
/// handed to the [`UsageTracker`] and never awaited.
pub struct EntitlementService<S: ServiceRepository, U: UsageRepository> {
    services: S,
    usage: U,
    tracker: UsageTracker,
}

impl<S: ServiceRepository, U: UsageRepository> EntitlementService<S, U> {
    pub fn new(services: S, usage: U, tracker: UsageTracker) -> Self {
        Self {
            services,
            usage,
            tracker,
        }
    }

    pub async fn list_definitions(&self) -> Result<Vec<ServiceDefinition>, TenancyError> {
        self.services
            .list_definitions()
            .await
            .map_err(TenancyError::storage("list_service_definitions", None))
    }

    pub async fn list_enabled(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<ServiceEntitlement>, TenancyError> {
        self.services
            .list_enabled(tenant_id)
            .await
            .map_err(TenancyError::storage("list_enabled_services", Some(tenant_id)))
    }

    pub async fn enable(
        &self,
        tenant_id: Uuid,
        service_name: &str,
        settings: Option<Value>,
    ) -> Result<EntitlementChange, TenancyError> {
        let definition = self.definition(service_name).await?;
        let existing = self.find(tenant_id, service_name).await?;

        if let Some(current) = existing {
            if current.enabled && settings.is_none() {
                return Ok(EntitlementChange::Unchanged(current));
            }
        }

        let entitlement = self.write(tenant_id, &definition, true, settings).await?;
        info!(%tenant_id, service = %service_name, "service enabled");
        Ok(EntitlementChange::Changed(entitlement))
    }

    /// Disable a service. Disabling a disabled service is `Unchanged`;
    /// disabling one that was never enabled is `Absent`.
    pub async fn disable(
        &self,
        tenant_id: Uuid,
        service_name: &str,
    ) -> Result<EntitlementChange, TenancyError> {
        let definition = self.definition(service_name).await?;

        match self.find(tenant_id, service_name).await? {
            None => Ok(EntitlementChange::Absent),
            Some(current) if !current.enabled => Ok(EntitlementChange::Unchanged(current)),
            Some(_) => {
                let entitlement = self.write(tenant_id, &definition, false, None).await?;
                info!(%tenant_id, service = %service_name, "service disabled");
                Ok(EntitlementChange::Changed(entitlement))
            }
        }
    }

    /// Flip the flag. A service with no row becomes enabled.
    pub async fn toggle(
        &self,
        tenant_id: Uuid,
        service_name: &str,
    ) -> Result<ServiceEntitlement, TenancyError> {
        let definition = self.definition(service_name).await?;
        let enabled = !self
            .find(tenant_id, service_name)
            .await?
            .is_some_and(|e| e.enabled);

        let entitlement = self.write(tenant_id, &definition, enabled, None).await?;
        info!(%tenant_id, service = %service_name, enabled, "service toggled");
        Ok(entitlement)
    }

    /// Gate on a single service. On success the call is counted towards
    /// today's usage.
    pub async fn require_service(
        &self,
        tenant_id: Uuid,
        service_name: &str,
    ) -> Result<ServiceEntitlement, TenancyError> {
        match self.find(tenant_id, service_name).await? {
            Some(entitlement) if entitlement.enabled => {
                self.tracker.record(tenant_id, entitlement.service_id);
                Ok(entitlement)
            }
            _ => {
                let display_name = self
                    .services
                    .get_definition(service_name)
                    .await
                    .map_err(TenancyError::storage("get_service_definition", Some(tenant_id)))?
                    .map(|d| d.display_name)
                    .unwrap_or_else(|| service_name.to_string());
                debug!(%tenant_id, service = %service_name, "service not enabled");
                Err(TenancyError::ServiceNotEnabled {
                    service: service_name.to_string(),
                    display_name,
                })
            }
        }
    }

    /// Gate on any one of `service_names`. The first enabled service, in
    /// the order given, is returned and counted.
    pub async fn require_any_service(
        &self,
        tenant_id: Uuid,
        service_names: &[&str],
    ) -> Result<ServiceEntitlement, TenancyError> {
        for name in service_names {
            if let Some(entitlement) = self.find(tenant_id, name).await? {
                if entitlement.enabled {
                    self.tracker.record(tenant_id, entitlement.service_id);
                    return Ok(entitlement);
                }
            }
        }

        debug!(%tenant_id, services = ?service_names, "none of the services are enabled");
        Err(TenancyError::NoServiceEnabled {
            services: service_names.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Recorded calls of a service on `day`.
    pub async fn usage_for(
        &self,
        tenant_id: Uuid,
        service_name: &str,
        day: NaiveDate,
    ) -> Result<u64, TenancyError> {
        let definition = self.definition(service_name).await?;
        self.usage
            .get_usage(tenant_id, definition.id, day)
            .await
            .map_err(TenancyError::storage("get_service_usage", Some(tenant_id)))
    }

    async fn definition(&self, service_name: &str) -> Result<ServiceDefinition, TenancyError> {
        self.services
            .get_definition(service_name)
            .await
            .map_err(TenancyError::storage("get_service_definition", None))?
            .ok_or_else(|| TenancyError::ServiceNotFound {
                service: service_name.to_string(),
            })
    }

    async fn find(
        &self,
        tenant_id: Uuid,
        service_name: &str,
    ) -> Result<Option<ServiceEntitlement>, TenancyError> {
        self.services
            .find_entitlement(tenant_id, service_name)
            .await
            .map_err(TenancyError::storage("find_entitlement", Some(tenant_id)))
    }

    async fn write(
        &self,
        tenant_id: Uuid,
        definition: &ServiceDefinition,
        enabled: bool,
        settings: Option<Value>,
    ) -> Result<ServiceEntitlement, TenancyError> {
        self.services
            .upsert_entitlement(UpsertEntitlement {
                tenant_id,
                service_id: definition.id,
                service_name: definition.name.clone(),
                enabled,
                settings,
            })
            .await
            .map_err(TenancyError::storage("upsert_entitlement", Some(tenant_id)))
    }
}

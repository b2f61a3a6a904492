//! Tenant resolution for incoming requests.
//!
//! Signals are consulted in a fixed order: host subdomain, then the
//! `X-Tenant-ID` header, then the authenticated principal's tenant, then
//! (single-tenant development only) the oldest tenant in storage. The
//! first signal that names an existing tenant wins; its status is checked
//! afterwards, so a suspended tenant never falls through to a later signal.

use std::net::IpAddr;

use groundwork_core::error::GroundworkError;
use groundwork_core::models::tenant::Tenant;
use groundwork_core::models::user::Principal;
use groundwork_core::repository::TenantRepository;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::TenancyConfig;
use crate::error::TenancyError;

/// The parts of a request that can identify a tenant.
#[derive(Debug, Clone, Default)]
pub struct TenantRequest {
    /// `Host` header value, port included or not.
    pub host: Option<String>,
    /// Raw `X-Tenant-ID` header value.
    pub tenant_header: Option<String>,
    pub principal: Option<Principal>,
}

/// Which signal identified the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Subdomain,
    Header,
    Principal,
    DevelopmentFallback,
}

#[derive(Debug, Clone)]
pub struct ResolvedTenant {
    pub tenant: Tenant,
    pub source: ResolutionSource,
}

/// Extract the tenant label from a host name.
///
/// Only the leftmost label of a name with at least three labels counts.
/// Loopback names, IP literals and `www` never yield a subdomain.
pub fn subdomain_from_host(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.');
    let host = strip_port(host);

    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let host = host.to_ascii_lowercase();
    if host == "localhost" || host.ends_with(".localhost") {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 3 {
        return None;
    }

    match labels[0] {
        "" | "www" => None,
        label => Some(label.to_string()),
    }
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal, with or without port.
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    // A bare IPv6 literal has several colons and no port.
    if host.matches(':').count() > 1 {
        return host;
    }
    host.split(':').next().unwrap_or(host)
}

/// Resolves the tenant a request acts on.
pub struct TenantResolver<T: TenantRepository> {
    tenants: T,
    config: TenancyConfig,
}

impl<T: TenantRepository> TenantResolver<T> {
    pub fn new(tenants: T, config: TenancyConfig) -> Self {
        Self { tenants, config }
    }

    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }

    pub async fn resolve(&self, request: &TenantRequest) -> Result<ResolvedTenant, TenancyError> {
        let (tenant, source) = self
            .lookup(request)
            .await?
            .ok_or(TenancyError::TenantNotFound)?;

        if !tenant.is_active() {
            debug!(tenant_id = %tenant.id, ?source, "request resolved to a suspended tenant");
            return Err(TenancyError::TenantSuspended {
                tenant_id: tenant.id,
            });
        }

        Ok(ResolvedTenant { tenant, source })
    }

    /// The first signal that matches a tenant wins, whatever its status.
    /// A suspended match is rejected by `resolve` rather than falling
    /// through to the next signal.
    async fn lookup(
        &self,
        request: &TenantRequest,
    ) -> Result<Option<(Tenant, ResolutionSource)>, TenancyError> {
        if let Some(subdomain) = request.host.as_deref().and_then(subdomain_from_host) {
            let found = self
                .tenants
                .find_by_subdomain(&subdomain)
                .await
                .map_err(TenancyError::storage("find_tenant_by_subdomain", None))?;
            if let Some(tenant) = found {
                return Ok(Some((tenant, ResolutionSource::Subdomain)));
            }
            debug!(%subdomain, "no tenant for subdomain");
        }

        if let Some(value) = request
            .tenant_header
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            let found = self
                .tenants
                .find_by_header(value)
                .await
                .map_err(TenancyError::storage("find_tenant_by_header", None))?;
            if let Some(tenant) = found {
                return Ok(Some((tenant, ResolutionSource::Header)));
            }
            debug!(header = %value, "no tenant for X-Tenant-ID");
        }

        if let Some(tenant_id) = request.principal.as_ref().and_then(|p| p.tenant_id) {
            let found = self
                .tenants
                .find_by_id(tenant_id)
                .await
                .map_err(TenancyError::storage("find_tenant_by_id", Some(tenant_id)))?;
            if let Some(tenant) = found {
                return Ok(Some((tenant, ResolutionSource::Principal)));
            }
        }

        if self.config.relaxed_mode() {
            let tenant = self.first_or_provision().await?;
            return Ok(Some((tenant, ResolutionSource::DevelopmentFallback)));
        }

        Ok(None)
    }

    /// The oldest tenant, provisioning the configured default when storage
    /// holds none.
    async fn first_or_provision(&self) -> Result<Tenant, TenancyError> {
        if let Some(tenant) = self.first().await? {
            return Ok(tenant);
        }

        let input = self.config.default_tenant.to_create();
        match self.tenants.create(input).await {
            Ok(tenant) => {
                info!(tenant_id = %tenant.id, subdomain = %tenant.subdomain, "provisioned default tenant");
                Ok(tenant)
            }
            // Lost a race with a concurrent provisioner.
            Err(GroundworkError::AlreadyExists { .. }) => {
                self.first().await?.ok_or(TenancyError::TenantNotFound)
            }
            Err(e) => Err(TenancyError::storage("provision_default_tenant", None)(e)),
        }
    }

    async fn first(&self) -> Result<Option<Tenant>, TenancyError> {
        self.tenants
            .first()
            .await
            .map_err(TenancyError::storage("find_first_tenant", None))
    }
}

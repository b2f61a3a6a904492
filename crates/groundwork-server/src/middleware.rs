//! Tenancy guards as axum middleware.
//!
//! Order on a tenant route: [`resolve_tenant`], [`require_tenant_user`],
//! then whichever of [`require_role`], [`check_tenant_limit`],
//! [`require_service`] and [`require_any_service`] the route needs.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::middleware::Next;
use axum::response::Response;
use groundwork_core::models::tenant::ResourceKind;
use groundwork_core::models::user::Principal;
use groundwork_tenancy::{ResolvedTenant, TenancyError, TenantRequest};

use crate::error::ApiError;
use crate::state::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Roles allowed to manage a tenant's users, job sites and services.
pub const ADMIN_ROLES: &[&str] = &["tenant_admin"];

fn header_value(headers: &HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn resolved(request: &Request) -> Result<&ResolvedTenant, ApiError> {
    request
        .extensions()
        .get::<ResolvedTenant>()
        .ok_or(ApiError::Tenancy(TenancyError::TenantNotFound))
}

fn principal(request: &Request) -> Result<&Principal, ApiError> {
    request
        .extensions()
        .get::<Principal>()
        .ok_or(ApiError::Tenancy(TenancyError::Unauthenticated))
}

/// Identify the tenant and attach it as a [`ResolvedTenant`].
pub async fn resolve_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant_request = TenantRequest {
        host: header_value(request.headers(), HOST),
        tenant_header: header_value(request.headers(), TENANT_HEADER),
        principal: request.extensions().get::<Principal>().cloned(),
    };

    let resolved = state.resolver.resolve(&tenant_request).await?;
    request.extensions_mut().insert(resolved);
    Ok(next.run(request).await)
}

/// Require an authenticated principal that belongs to the resolved tenant.
pub async fn require_tenant_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant_id = resolved(&request)?.tenant.id;
    state.guard.verify_membership(principal(&request)?, tenant_id)?;
    Ok(next.run(request).await)
}

/// Require one of `allowed` roles. Use through a closure:
/// `from_fn(|req, next| require_role(&["tenant_admin"], req, next))`.
pub async fn require_role(
    allowed: &'static [&'static str],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    groundwork_tenancy::require_role(principal(&request)?, allowed)?;
    Ok(next.run(request).await)
}

/// Reject the request when the tenant has no room for one more `kind`.
pub async fn check_tenant_limit(
    state: AppState,
    kind: ResourceKind,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant = resolved(&request)?.tenant.clone();
    state.quotas.check(&tenant, kind).await?;
    Ok(next.run(request).await)
}

/// Require `service` and attach its entitlement.
pub async fn require_service(
    state: AppState,
    service: &'static str,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant_id = resolved(&request)?.tenant.id;
    let entitlement = state.entitlements.require_service(tenant_id, service).await?;
    request.extensions_mut().insert(entitlement);
    Ok(next.run(request).await)
}

/// Require any one of `services` and attach the entitlement that matched.
pub async fn require_any_service(
    state: AppState,
    services: &'static [&'static str],
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant_id = resolved(&request)?.tenant.id;
    let entitlement = state
        .entitlements
        .require_any_service(tenant_id, services)
        .await?;
    request.extensions_mut().insert(entitlement);
    Ok(next.run(request).await)
}

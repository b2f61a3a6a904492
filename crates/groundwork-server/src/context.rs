//! Extractors for what the middleware stack attaches to a request.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use groundwork_core::models::service::ServiceEntitlement;
use groundwork_core::models::tenant::Tenant;
use groundwork_core::models::user::Principal;
use groundwork_tenancy::{ResolvedTenant, TenancyError};

use crate::error::ApiError;

/// The tenant the request was resolved to.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub ResolvedTenant);

impl CurrentTenant {
    pub fn tenant(&self) -> &Tenant {
        &self.0.tenant
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedTenant>()
            .cloned()
            .map(Self)
            .ok_or(ApiError::Tenancy(TenancyError::TenantNotFound))
    }
}

/// The authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Self)
            .ok_or(ApiError::Tenancy(TenancyError::Unauthenticated))
    }
}

/// The entitlement that let the request through a service gate.
#[derive(Debug, Clone)]
pub struct GrantedService(pub ServiceEntitlement);

#[async_trait]
impl<S> FromRequestParts<S> for GrantedService
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ServiceEntitlement>()
            .cloned()
            .map(Self)
            .ok_or(ApiError::Tenancy(TenancyError::NoServiceEnabled {
                services: Vec::new(),
            }))
    }
}

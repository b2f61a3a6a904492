//! Service catalog and the tenant's entitlements.

use axum::extract::{Path, Request, State};
use axum::middleware::{self, Next};
use axum::routing::{get, post};
use axum::{Json, Router};
use groundwork_core::models::service::{ServiceDefinition, ServiceEntitlement};
use groundwork_tenancy::{EntitlementChange, TenancyError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::CurrentTenant;
use crate::error::ApiError;
use crate::middleware::{ADMIN_ROLES, require_role};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let admin = Router::new()
        .route("/services/:name/enable", post(enable_service))
        .route("/services/:name/disable", post(disable_service))
        .route("/services/:name/toggle", post(toggle_service))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_role(ADMIN_ROLES, req, next)
        }));

    Router::new()
        .route("/services", get(list_services))
        .route("/services/enabled", get(list_enabled_services))
        .merge(admin)
}

#[derive(Debug, Default, Deserialize)]
pub struct EnableServiceRequest {
    pub settings: Option<Value>,
}

#[derive(Serialize)]
pub struct EntitlementResponse {
    pub service: String,
    pub changed: bool,
    pub entitlement: Option<ServiceEntitlement>,
}

impl EntitlementResponse {
    fn new(service: String, change: EntitlementChange) -> Self {
        Self {
            service,
            changed: change.is_changed(),
            entitlement: change.entitlement().cloned(),
        }
    }
}

pub async fn list_services(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceDefinition>>, ApiError> {
    Ok(Json(state.entitlements.list_definitions().await?))
}

pub async fn list_enabled_services(
    State(state): State<AppState>,
    tenant: CurrentTenant,
) -> Result<Json<Vec<ServiceEntitlement>>, ApiError> {
    Ok(Json(state.entitlements.list_enabled(tenant.tenant().id).await?))
}

pub async fn enable_service(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(name): Path<String>,
    body: Option<Json<EnableServiceRequest>>,
) -> Result<Json<EntitlementResponse>, ApiError> {
    let settings = body.and_then(|Json(body)| body.settings);
    let change = state
        .entitlements
        .enable(tenant.tenant().id, &name, settings)
        .await?;
    Ok(Json(EntitlementResponse::new(name, change)))
}

/// Unlike the underlying store, the route reports a service that was
/// never enabled as not found.
pub async fn disable_service(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(name): Path<String>,
) -> Result<Json<EntitlementResponse>, ApiError> {
    match state.entitlements.disable(tenant.tenant().id, &name).await? {
        EntitlementChange::Absent => {
            Err(TenancyError::EntitlementNotFound { service: name }.into())
        }
        change => Ok(Json(EntitlementResponse::new(name, change))),
    }
}

pub async fn toggle_service(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(name): Path<String>,
) -> Result<Json<EntitlementResponse>, ApiError> {
    let entitlement = state.entitlements.toggle(tenant.tenant().id, &name).await?;
    Ok(Json(EntitlementResponse {
        service: name,
        changed: true,
        entitlement: Some(entitlement),
    }))
}

//! The current tenant and its quota usage.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use groundwork_core::models::tenant::Tenant;
use groundwork_tenancy::{QuotaStatus, ResolutionSource};
use serde::Serialize;

use crate::context::CurrentTenant;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/tenant", get(current_tenant))
}

#[derive(Serialize)]
pub struct TenantResponse {
    pub tenant: Tenant,
    pub resolved_by: ResolutionSource,
    pub quotas: Vec<QuotaStatus>,
}

pub async fn current_tenant(
    State(state): State<AppState>,
    CurrentTenant(resolved): CurrentTenant,
) -> Result<Json<TenantResponse>, ApiError> {
    let quotas = state.quotas.summary(&resolved.tenant).await?;
    Ok(Json(TenantResponse {
        tenant: resolved.tenant,
        resolved_by: resolved.source,
        quotas,
    }))
}

//! Third-party integrations gated on their service.

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::context::GrantedService;
use crate::middleware::require_service;
use crate::state::AppState;

pub const CRM_SYNC: &str = "crm_sync";

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/integrations/crm", get(crm_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |State(state): State<AppState>, req: Request, next: Next| {
                require_service(state, CRM_SYNC, req, next)
            },
        ))
}

#[derive(Serialize)]
pub struct IntegrationStatus {
    pub service: String,
    pub enabled_at: Option<DateTime<Utc>>,
    pub settings: Value,
}

pub async fn crm_status(GrantedService(entitlement): GrantedService) -> Json<IntegrationStatus> {
    Json(IntegrationStatus {
        service: entitlement.service_name,
        enabled_at: entitlement.enabled_at,
        settings: entitlement.settings,
    })
}

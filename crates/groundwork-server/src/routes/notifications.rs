//! Notification channels, reachable through either messaging service.

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::context::CurrentTenant;
use crate::error::ApiError;
use crate::middleware::require_any_service;
use crate::state::AppState;

pub const CHANNEL_SERVICES: &[&str] = &["sms_notifications", "email_notifications"];

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/notifications/channels", get(list_channels))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |State(state): State<AppState>, req: Request, next: Next| {
                require_any_service(state, CHANNEL_SERVICES, req, next)
            },
        ))
}

#[derive(Serialize)]
pub struct ChannelsResponse {
    pub channels: Vec<String>,
}

pub async fn list_channels(
    State(state): State<AppState>,
    tenant: CurrentTenant,
) -> Result<Json<ChannelsResponse>, ApiError> {
    let channels = state
        .entitlements
        .list_enabled(tenant.tenant().id)
        .await?
        .into_iter()
        .map(|e| e.service_name)
        .filter(|name| CHANNEL_SERVICES.contains(&name.as_str()))
        .collect();
    Ok(Json(ChannelsResponse { channels }))
}

//! Tenant user management.

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::routing::get;
use axum::{Json, Router};
use groundwork_core::models::role::{Role, normalize_role};
use groundwork_core::models::tenant::ResourceKind;
use groundwork_core::models::user::{CreateUser, User, UserStatus};
use groundwork_core::repository::{PaginatedResult, Pagination, UserRepository};
use serde::Deserialize;

use crate::context::CurrentTenant;
use crate::error::ApiError;
use crate::middleware::{ADMIN_ROLES, require_role};
use crate::routes::clamp_page;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_role(ADMIN_ROLES, req, next)
        }))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub status: Option<UserStatus>,
}

pub async fn list_users(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResult<User>>, ApiError> {
    let tenant_id = tenant.tenant().id;
    let page = state
        .users
        .list(tenant_id, clamp_page(pagination))
        .await
        .map_err(ApiError::storage("list_users", Some(tenant_id)))?;
    Ok(Json(page))
}

/// Counts against the `users` quota, and also `clients` when the new
/// account is a client.
pub async fn create_user(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let role = normalize_role(&body.role)
        .ok_or_else(|| ApiError::Validation(format!("unknown role: {}", body.role)))?;

    let tenant = tenant.tenant();
    state.quotas.check(tenant, ResourceKind::Users).await?;
    if role == Role::Client {
        state.quotas.check(tenant, ResourceKind::Clients).await?;
    }

    let user = state
        .users
        .create(CreateUser {
            tenant_id: Some(tenant.id),
            username: body.username,
            email: body.email,
            password: body.password,
            role: role.as_str().to_string(),
            status: body.status,
        })
        .await
        .map_err(ApiError::storage("create_user", Some(tenant.id)))?;

    Ok((StatusCode::CREATED, Json(user)))
}

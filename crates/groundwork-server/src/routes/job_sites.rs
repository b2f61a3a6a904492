//! Job sites.

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::routing::{get, post};
use axum::{Json, Router};
use groundwork_core::models::job_site::{CreateJobSite, JobSite};
use groundwork_core::models::tenant::ResourceKind;
use groundwork_core::repository::{JobSiteRepository, PaginatedResult, Pagination};
use serde::Deserialize;

use crate::context::CurrentTenant;
use crate::error::ApiError;
use crate::middleware::{ADMIN_ROLES, check_tenant_limit, require_role};
use crate::routes::clamp_page;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let create = post(create_job_site)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |State(state): State<AppState>, req: Request, next: Next| {
                check_tenant_limit(state, ResourceKind::JobSites, req, next)
            },
        ))
        .layer(middleware::from_fn(|req: Request, next: Next| {
            require_role(ADMIN_ROLES, req, next)
        }));

    Router::new().route("/job-sites", get(list_job_sites).merge(create))
}

#[derive(Debug, Deserialize)]
pub struct CreateJobSiteRequest {
    pub name: String,
    pub address: Option<String>,
    pub status: Option<String>,
}

pub async fn list_job_sites(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResult<JobSite>>, ApiError> {
    let tenant_id = tenant.tenant().id;
    let page = state
        .job_sites
        .list(tenant_id, clamp_page(pagination))
        .await
        .map_err(ApiError::storage("list_job_sites", Some(tenant_id)))?;
    Ok(Json(page))
}

pub async fn create_job_site(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(body): Json<CreateJobSiteRequest>,
) -> Result<(StatusCode, Json<JobSite>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("job site name must not be empty".into()));
    }

    let tenant_id = tenant.tenant().id;
    let site = state
        .job_sites
        .create(CreateJobSite {
            tenant_id,
            name: body.name,
            address: body.address,
            status: body.status,
        })
        .await
        .map_err(ApiError::storage("create_job_site", Some(tenant_id)))?;

    Ok((StatusCode::CREATED, Json(site)))
}

//! Groundwork Server: the HTTP surface in front of the tenancy guards.

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod shutdown;
pub mod state;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the application router.
///
/// Every `/api` route runs tenant resolution and the membership check
/// before its own guards; `/health` runs neither.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::tenant::router())
        .merge(routes::services::router())
        .merge(routes::users::router())
        .merge(routes::job_sites::router(&state))
        .merge(routes::integrations::router(&state))
        .merge(routes::notifications::router(&state))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_tenant_user,
        ))
        .route_layer(from_fn_with_state(state.clone(), middleware::resolve_tenant));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", api)
        .layer(from_fn_with_state(state.clone(), auth::authenticate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Groundwork server entry point.

use std::process;

use groundwork_db::DbManager;
use groundwork_server::config::{LogFormat, ServerConfig};
use groundwork_server::{AppState, build_router, shutdown};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level));

    match config.logging.log_format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let config = ServerConfig::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        process::exit(1);
    });

    init_tracing(&config);

    if config.single_tenant_mode_ignored() {
        warn!("SINGLE_TENANT_MODE is set in production and will be ignored");
    }

    let db = match DbManager::connect(&config.db_config()).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "failed to connect to SurrealDB");
            process::exit(1);
        }
    };

    let state = AppState::new(
        db.client().clone(),
        config.tenancy_config(),
        config.auth_config(),
    );
    let tracker = state.tracker.clone();

    let addr = config.socket_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };

    info!(%addr, environment = %config.tenancy.app_env, "Starting Groundwork server");

    let served = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = shutdown::wait_for_signal().await {
                error!(error = %e, "shutdown signal handler failed");
            }
        })
        .await;

    if let Err(e) = served {
        error!(error = %e, "server error");
    }

    tracker.shutdown().await;
    info!("Groundwork server stopped.");
}

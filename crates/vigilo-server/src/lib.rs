//! HTTP front end for Vigilo.
//!
//! Serves two read-only search endpoints over one in-memory item registry:
//!
//! - `GET /items/search` backs the browser map view. With `lat` and `lng` it
//!   runs a radius search and every item carries a `distance`; without them it
//!   runs a filter-only search ordered by reward.
//! - `GET /api/items/nearby` is the programmatic endpoint and requires
//!   coordinates.
//!
//! Both accept `radius`, `q`, `category`, `city` (or `address`) and
//! `date_range`, and answer with `{success, count, items}` or
//! `{success: false, error}`.
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

pub mod config;
pub mod error;
pub mod payload;
pub mod routes;
pub mod state;

use config::Config;
use error::AppError;
use routes::{health_handler, nearby_handler, search_handler};
use state::AppState;

/// The service with all routes and layers, ready to serve or to call in tests.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/items/search", get(search_handler))
        .route("/api/items/nearby", get(nearby_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: Config) -> Result<(), AppError> {
    info!("Initializing state...");
    let state = tokio::task::spawn_blocking(move || AppState::new(config)).await??;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

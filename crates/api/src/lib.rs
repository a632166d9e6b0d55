//! # Carpool API
//!
//! HTTP surface of the carpool slot engine. Every route maps onto one engine
//! operation; the caller is identified by the `x-caller-id` header.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Extract requests and call into the engine
//! - **Middleware**: Caller extraction and error-to-response mapping
//! - **Config**: Environment configuration
//!
//! The router is generic over the slot store so tests can serve it from the
//! in-memory store.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Caller extraction and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
};
use carpool_core::store::SlotStore;
use carpool_engine::SlotEngine;
use eyre::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use middleware::auth::CALLER_HEADER;

/// Shared application state that is accessible to all request handlers
pub struct ApiState<S: SlotStore> {
    pub engine: SlotEngine<S>,
}

/// Builds the application router with all routes and the shared state attached.
pub fn build_router<S: SlotStore>(state: Arc<ApiState<S>>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Slot, vehicle and child assignment endpoints
        .merge(routes::slots::routes())
        // Group schedule listing
        .merge(routes::schedule::routes())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(CALLER_HEADER),
        ])
        .allow_origin(origins)
        .allow_credentials(true)
}

/// Starts the API server with the provided configuration and engine
pub async fn start_server<S: SlotStore>(config: config::ApiConfig, engine: SlotEngine<S>) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState { engine });
    let app = build_router(state).layer(TraceLayer::new_for_http());

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|err: BoxError| async move {
                if err.is::<tower::timeout::error::Elapsed>() {
                    StatusCode::REQUEST_TIMEOUT
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "Server listening on http://{} (conflict scope: {}, transaction timeout: {:?})",
        addr, config.conflict_scope, config.transaction_timeout
    );
    axum::serve(listener, app).await?;

    Ok(())
}

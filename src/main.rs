// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::application::athlete_service::AthleteService;
use crate::application::series_resolver::SeriesResolver;
use crate::application::streaming_service::SessionStreamService;
use crate::application::view_service::ViewService;
use crate::infrastructure::config::{load_server_config, load_store_config};
use crate::infrastructure::postgrest_store::PostgrestStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_view, delete_view, health_check, list_athletes, list_sessions, save_phase,
    session_catalog, session_series, session_stats, stream_session, view_events, view_snapshot,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let store_config = load_store_config()?;
    let server_config = load_server_config()?;

    // Create the store (infrastructure layer)
    let store = Arc::new(PostgrestStore::new(
        store_config.postgrest.base_url,
        store_config.postgrest.api_key,
    ));

    // Create services (application layer)
    let resolver = SeriesResolver::new(store.clone());
    let view_service = ViewService::new(resolver, store.clone(), store.clone());
    let athlete_service = AthleteService::new(store.clone());
    let stream_service = SessionStreamService::new(view_service.clone(), athlete_service.clone());

    // Create application state
    let state = Arc::new(AppState::new(
        athlete_service,
        view_service,
        stream_service,
        Duration::from_millis(server_config.server.frame_interval_ms),
    ));

    // Build router (presentation layer)
    // Note: We handle compression manually in our response builders
    // (per-chunk for streams), so we don't use CompressionLayer to avoid
    // double compression/decompression
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/athletes", get(list_athletes))
        .route("/athletes/:id/sessions", get(list_sessions))
        .route("/sessions/:id/catalog", get(session_catalog))
        .route("/sessions/:id/series", get(session_series))
        .route("/sessions/:id/stats", get(session_stats))
        .route("/sessions/:id/phases", post(save_phase))
        .route("/sessions/:id/stream", get(stream_session))
        .route("/views", post(create_view))
        .route("/views/:id", get(view_snapshot).delete(delete_view))
        .route("/views/:id/events", post(view_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = server_config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", server_config.server.bind))?;
    println!("Starting athlete-viewer service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}

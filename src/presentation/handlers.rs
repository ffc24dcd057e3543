// HTTP request handlers
use crate::application::session_view::{spawn_view, ViewEvent};
use crate::application::view_service::StatRow;
use crate::domain::chart::ChartPayload;
use crate::domain::metric::MetricMeta;
use crate::domain::phase::Phase;
use crate::domain::video::VideoInfo;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct SeriesQuery {
    pub metrics: Option<String>,
    pub smooth: Option<i32>,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub metrics: Option<String>,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub session_id: String,
    pub metrics: Vec<String>,
    pub auto_level: Option<i64>,
    pub meta: HashMap<String, MetricMeta>,
    pub phases: Vec<Phase>,
    pub video: Option<VideoInfo>,
}

#[derive(Deserialize)]
pub struct SavePhaseRequest {
    pub name: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Deserialize)]
pub struct CreateViewRequest {
    pub session_id: String,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub smooth: bool,
}

#[derive(Serialize)]
pub struct CreateViewResponse {
    pub view_id: String,
}

/// Comma-separated metric list from a query parameter.
fn parse_metric_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all athletes
pub async fn list_athletes(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let athletes = state.athlete_service.athletes().await;
    match json_response(&athletes, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// List an athlete's sessions, newest first
pub async fn list_sessions(
    Path(athlete_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let sessions = state.athlete_service.sessions(&athlete_id).await;
    match json_response(&sessions, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Metric catalog for a session, optionally narrowed by `?q=`
pub async fn session_catalog(
    Path(session_id): Path<String>,
    Query(query): Query<CatalogQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);

    let (catalog, meta) = state
        .view_service
        .catalog(&session_id, query.q.as_deref())
        .await;
    let phases = state.view_service.phases(&session_id).await;
    let video = state
        .athlete_service
        .session(&session_id)
        .await
        .and_then(|s| s.video);

    let response = CatalogResponse {
        session_id,
        metrics: catalog.metrics,
        auto_level: catalog.auto_level,
        meta,
        phases,
        video,
    };
    match json_response(&response, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stateless chart payload for `?metrics=a,b&smooth=1`
pub async fn session_series(
    Path(session_id): Path<String>,
    Query(query): Query<SeriesQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let metrics = parse_metric_list(query.metrics.as_deref());
    let smooth_on = query.smooth.unwrap_or(0) != 0;

    let payload: ChartPayload = state
        .view_service
        .chart(&session_id, &metrics, smooth_on)
        .await;
    match json_response(&payload, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Per-phase statistics rows for `?metrics=a,b`
pub async fn session_stats(
    Path(session_id): Path<String>,
    Query(query): Query<StatsQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let metrics = parse_metric_list(query.metrics.as_deref());

    let rows: Vec<StatRow> = state.view_service.stats(&session_id, &metrics).await;
    match json_response(&rows, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Insert a phase and return the refreshed list
pub async fn save_phase(
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SavePhaseRequest>,
) -> impl IntoResponse {
    let name = request.name.trim();
    if name.is_empty() {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }

    match state
        .view_service
        .save_phase(&session_id, name, request.start_ms, request.end_ms)
        .await
    {
        Ok(phases) => match json_response(&phases, false).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            tracing::error!("phase save failed for session {}: {}", session_id, e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Stream a session progressively (skeleton, then series, then complete)
pub async fn stream_session(
    Path(session_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let rx = state.stream_service.stream_session(&session_id).await;
    stream_from_receiver(rx, compress).await
}

/// Create an interactive view actor
pub async fn create_view(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateViewRequest>,
) -> impl IntoResponse {
    let handle = spawn_view(
        state.view_service.clone(),
        state.athlete_service.clone(),
        state.frame_interval,
    );

    handle
        .apply(ViewEvent::EnterSession {
            session_id: request.session_id,
        })
        .await;
    if !request.metrics.is_empty() {
        handle
            .apply(ViewEvent::SetSelection {
                metrics: request.metrics,
            })
            .await;
    }
    if request.smooth {
        handle.apply(ViewEvent::SetSmoothing { on: true }).await;
    }

    let view_id = state.register_view(handle).await;
    tracing::debug!("created view {}", view_id);
    Json(CreateViewResponse { view_id })
}

/// Full snapshot of an interactive view
pub async fn view_snapshot(
    Path(view_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let Some(handle) = state.view(&view_id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match handle.snapshot().await {
        Some(snapshot) => match json_response(&snapshot, compress).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Apply a batch of events to an interactive view
pub async fn view_events(
    Path(view_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(events): Json<Vec<ViewEvent>>,
) -> impl IntoResponse {
    let Some(handle) = state.view(&view_id).await else {
        return StatusCode::NOT_FOUND;
    };

    for event in events {
        if !handle.apply(event).await {
            return StatusCode::NOT_FOUND;
        }
    }
    StatusCode::NO_CONTENT
}

/// Tear an interactive view down
pub async fn delete_view(
    Path(view_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.remove_view(&view_id).await {
        Some(handle) => {
            handle.shutdown().await;
            tracing::debug!("deleted view {}", view_id);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

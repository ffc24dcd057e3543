// View assembly service - chart payloads, stat tables and phase editing
use crate::application::series_resolver::{SeriesCatalog, SeriesResolver};
use crate::application::stores::{MetaStore, PhaseStore, StoreResult};
use crate::domain::chart::{ChartPayload, LineSeries, OverlayShape, PhaseLabel, MS_PER_SEC, PALETTE};
use crate::domain::metric::{metric_label, MetricMeta};
use crate::domain::phase::{phase_stats, Phase, PhaseStats};
use crate::domain::series::PointSeries;
use crate::domain::smoothing::smooth;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Display smoothing half-width (an 11-sample moving-average window away
/// from the edges).
pub const SMOOTH_RADIUS: usize = 5;

/// One row of the per-phase statistics table.
#[derive(Debug, Clone, Serialize)]
pub struct StatRow {
    pub metric: String,
    pub label: String,
    pub phase: String,
    pub mean: Option<f64>,
    pub peak: Option<f64>,
    pub time_to_peak_ms: Option<i64>,
}

/// Read-side assembly for one session: resolves series, decorates them
/// with metadata and phases, and shapes the chart/stats payloads. All
/// store reads degrade to empty on failure.
#[derive(Clone)]
pub struct ViewService {
    resolver: SeriesResolver,
    meta_store: Arc<dyn MetaStore>,
    phase_store: Arc<dyn PhaseStore>,
}

impl ViewService {
    pub fn new(
        resolver: SeriesResolver,
        meta_store: Arc<dyn MetaStore>,
        phase_store: Arc<dyn PhaseStore>,
    ) -> Self {
        Self {
            resolver,
            meta_store,
            phase_store,
        }
    }

    pub fn resolver(&self) -> &SeriesResolver {
        &self.resolver
    }

    /// Discovers the session's metric catalog, optionally narrowed by a
    /// search query, together with metadata for the surviving names.
    pub async fn catalog(
        &self,
        session_id: &str,
        query: Option<&str>,
    ) -> (SeriesCatalog, HashMap<String, MetricMeta>) {
        let mut catalog = self.resolver.discover(session_id).await;
        let meta = self.metric_meta_map(&catalog.metrics).await;
        if let Some(q) = query {
            catalog.metrics = filter_metrics(&catalog.metrics, &meta, q);
        }
        let meta = meta
            .into_iter()
            .filter(|(name, _)| catalog.metrics.contains(name))
            .collect();
        (catalog, meta)
    }

    /// Metadata rows keyed by metric. Metrics without a row are simply
    /// absent from the map.
    pub async fn metric_meta_map(&self, metrics: &[String]) -> HashMap<String, MetricMeta> {
        if metrics.is_empty() {
            return HashMap::new();
        }
        match self.meta_store.metric_meta(metrics).await {
            Ok(rows) => rows.into_iter().map(|m| (m.metric.clone(), m)).collect(),
            Err(e) => {
                tracing::warn!("metric metadata query failed: {}", e);
                HashMap::new()
            }
        }
    }

    pub async fn phases(&self, session_id: &str) -> Vec<Phase> {
        match self.phase_store.list_phases(session_id).await {
            Ok(phases) => phases,
            Err(e) => {
                tracing::warn!("phase query failed for session {}: {}", session_id, e);
                Vec::new()
            }
        }
    }

    /// Stateless chart payload for the requested metrics (no cursor or
    /// draft overlays; those belong to interactive views).
    pub async fn chart(
        &self,
        session_id: &str,
        metrics: &[String],
        smooth_on: bool,
    ) -> ChartPayload {
        let series = self.resolver.resolve(session_id, metrics).await;
        let meta = self.metric_meta_map(metrics).await;
        let phases = self.phases(session_id).await;
        build_chart(metrics, &series, &meta, &phases, smooth_on, None, None)
    }

    /// Per-phase statistics rows, metric-major in request order.
    pub async fn stats(&self, session_id: &str, metrics: &[String]) -> Vec<StatRow> {
        let series = self.resolver.resolve(session_id, metrics).await;
        let meta = self.metric_meta_map(metrics).await;
        let phases = self.phases(session_id).await;
        build_stat_rows(metrics, &series, &meta, &phases)
    }

    /// Persists a phase (bounds normalized to ascending order) and returns
    /// the refreshed phase list. Write failures propagate to the caller,
    /// unlike read failures.
    pub async fn save_phase(
        &self,
        session_id: &str,
        name: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> StoreResult<Vec<Phase>> {
        let phase = Phase::new(name, start_ms.min(end_ms), start_ms.max(end_ms));
        self.phase_store.insert_phase(session_id, &phase).await?;
        tracing::debug!("saved phase '{}' for session {}", phase.name, session_id);
        self.phase_store.list_phases(session_id).await
    }
}

/// Line or card color for a metric: the stored color when present, else a
/// palette color chosen by list position.
pub fn color_for(meta: Option<&MetricMeta>, position: usize) -> String {
    meta.and_then(|m| m.color.clone())
        .unwrap_or_else(|| PALETTE[position % PALETTE.len()].to_string())
}

/// Case-insensitive substring filter over metric names and display labels.
/// A blank query keeps everything.
pub fn filter_metrics(
    metrics: &[String],
    meta: &HashMap<String, MetricMeta>,
    query: &str,
) -> Vec<String> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return metrics.to_vec();
    }
    metrics
        .iter()
        .filter(|name| {
            name.to_lowercase().contains(&q)
                || metric_label(name, meta.get(*name)).to_lowercase().contains(&q)
        })
        .cloned()
        .collect()
}

/// Converts draft rectangle bounds in seconds (either order) into ordered
/// millisecond bounds.
pub fn draft_bounds_ms(x0_s: f64, x1_s: f64) -> (i64, i64) {
    let lo = (x0_s.min(x1_s) * MS_PER_SEC).round() as i64;
    let hi = (x0_s.max(x1_s) * MS_PER_SEC).round() as i64;
    (lo, hi)
}

/// One chart line in display coordinates (x in seconds).
pub fn build_line(
    metric: &str,
    points: &PointSeries,
    meta: Option<&MetricMeta>,
    position: usize,
    smooth_on: bool,
) -> LineSeries {
    let x = points
        .points()
        .iter()
        .map(|p| p.time_ms as f64 / MS_PER_SEC)
        .collect();
    let mut y = points.values();
    if smooth_on {
        y = smooth(&y, SMOOTH_RADIUS);
    }
    LineSeries {
        metric: metric.to_string(),
        name: metric_label(metric, meta),
        color: color_for(meta, position),
        x,
        y,
    }
}

/// Assembles the chart payload: one line per requested metric that
/// resolved, in request order, plus phase bands, optional cursor line and
/// draft band, and phase labels at band centers. Coordinates are seconds.
pub fn build_chart(
    order: &[String],
    series: &HashMap<String, Arc<PointSeries>>,
    meta: &HashMap<String, MetricMeta>,
    phases: &[Phase],
    smooth_on: bool,
    cursor_ms: Option<i64>,
    draft_s: Option<(f64, f64)>,
) -> ChartPayload {
    let mut payload = ChartPayload::default();

    for (i, metric) in order.iter().enumerate() {
        let Some(points) = series.get(metric) else {
            continue;
        };
        payload
            .series
            .push(build_line(metric, points, meta.get(metric), i, smooth_on));
    }

    for phase in phases {
        payload.shapes.push(OverlayShape::PhaseBand {
            x0: phase.start_ms as f64 / MS_PER_SEC,
            x1: phase.end_ms as f64 / MS_PER_SEC,
        });
        payload.annotations.push(PhaseLabel {
            x: (phase.start_ms + phase.end_ms) as f64 / (2.0 * MS_PER_SEC),
            text: phase.name.clone(),
        });
    }

    if let Some(t) = cursor_ms {
        payload.shapes.push(OverlayShape::CursorLine {
            x: t as f64 / MS_PER_SEC,
        });
    }
    if let Some((x0, x1)) = draft_s {
        payload.shapes.push(OverlayShape::DraftBand {
            x0: x0.min(x1),
            x1: x0.max(x1),
        });
    }

    payload
}

/// Statistics rows for every (metric, phase) pair, metric-major. Metrics
/// that did not resolve still get rows so the table shape is stable.
pub fn build_stat_rows(
    order: &[String],
    series: &HashMap<String, Arc<PointSeries>>,
    meta: &HashMap<String, MetricMeta>,
    phases: &[Phase],
) -> Vec<StatRow> {
    let mut rows = Vec::with_capacity(order.len() * phases.len());
    for metric in order {
        let label = metric_label(metric, meta.get(metric));
        for phase in phases {
            let stats = series
                .get(metric)
                .map(|s| phase_stats(s, phase))
                .unwrap_or(PhaseStats::EMPTY);
            rows.push(StatRow {
                metric: metric.clone(),
                label: label.clone(),
                phase: phase.name.clone(),
                mean: stats.mean,
                peak: stats.peak,
                time_to_peak_ms: stats.time_to_peak_ms,
            });
        }
    }
    rows
}

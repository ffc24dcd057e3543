// Interactive session view - one actor task owns one client's view state
use crate::application::athlete_service::AthleteService;
use crate::application::cursor::{CursorState, FrameGate};
use crate::application::selection::SelectionState;
use crate::application::series_resolver::SeriesCatalog;
use crate::application::view_service::{
    build_chart, build_stat_rows, color_for, draft_bounds_ms, StatRow, ViewService,
};
use crate::domain::chart::ChartPayload;
use crate::domain::metric::{metric_label, MetricMeta};
use crate::domain::phase::Phase;
use crate::domain::series::PointSeries;
use crate::domain::video::VideoInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

/// Events a client can apply to an interactive view.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    EnterSession { session_id: String },
    ToggleMetric { metric: String },
    SetSelection { metrics: Vec<String> },
    RemoveMetric { metric: String },
    ReorderTray { from: usize, to: usize },
    Hover { t_ms: i64 },
    SetCursor { t_ms: i64 },
    SetSmoothing { on: bool },
    DraftPhase { x0_s: f64, x1_s: f64 },
    ClearDraft,
    SavePhase { name: String },
}

/// Messages the actor task consumes. Clients send `Apply`/`Snapshot`/
/// `Shutdown` through a [`ViewHandle`]; the loader and resolver tasks the
/// actor spawns answer with `SessionLoaded`/`Resolved`.
pub enum ViewCommand {
    Apply(ViewEvent),
    SessionLoaded {
        epoch: u64,
        catalog: SeriesCatalog,
        meta: HashMap<String, MetricMeta>,
        phases: Vec<Phase>,
        video: Option<VideoInfo>,
    },
    Resolved {
        generation: u64,
        series: HashMap<String, Arc<PointSeries>>,
    },
    Snapshot(oneshot::Sender<ViewSnapshot>),
    Shutdown,
}

/// One tray card, colored by tray position and dimmed when deselected.
/// `value` is the interpolated readout at the cursor.
#[derive(Debug, Clone, Serialize)]
pub struct CardPayload {
    pub metric: String,
    pub label: String,
    pub color: String,
    pub dimmed: bool,
    pub value: Option<f64>,
}

/// Everything a client needs to render the view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub session_id: String,
    pub metrics: Vec<String>,
    pub auto_level: Option<i64>,
    pub selected: Vec<String>,
    pub tray: Vec<String>,
    pub cursor_ms: i64,
    pub smooth: bool,
    pub phases: Vec<Phase>,
    pub video: Option<VideoInfo>,
    pub cards: Vec<CardPayload>,
    pub chart: ChartPayload,
    pub stats: Vec<StatRow>,
}

/// State machine behind one view. All transitions are synchronous; the
/// surrounding actor performs the IO and feeds results back in, tagged
/// with the epoch/generation captured when the work was started.
///
/// Two staleness guards: `epoch` covers session loads (catalog, metadata,
/// phases, video) and `generation` covers series resolves. A completion
/// carrying a stale tag is discarded, so a session switch or selection
/// change mid-flight can never be overwritten by the older request.
pub struct SessionView {
    session_id: String,
    catalog: SeriesCatalog,
    series: HashMap<String, Arc<PointSeries>>,
    meta: HashMap<String, MetricMeta>,
    phases: Vec<Phase>,
    video: Option<VideoInfo>,
    cursor: CursorState,
    gate: FrameGate,
    selection: SelectionState,
    smooth_on: bool,
    draft_s: Option<(f64, f64)>,
    epoch: u64,
    generation: u64,
}

impl SessionView {
    pub fn new() -> Self {
        Self {
            session_id: String::new(),
            catalog: SeriesCatalog::default(),
            series: HashMap::new(),
            meta: HashMap::new(),
            phases: Vec::new(),
            video: None,
            cursor: CursorState::new(),
            gate: FrameGate::new(),
            selection: SelectionState::new(),
            smooth_on: false,
            draft_s: None,
            epoch: 0,
            generation: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Switches the view to another session: session-scoped state is
    /// dropped, the cursor snaps back to zero with any pending hover, and
    /// both staleness counters advance so in-flight work for the old
    /// session dies on arrival. The selection survives and is pruned
    /// against the new catalog once it loads.
    pub fn enter_session(&mut self, session_id: &str) -> u64 {
        self.session_id = session_id.to_string();
        self.catalog = SeriesCatalog::default();
        self.series.clear();
        self.meta.clear();
        self.phases.clear();
        self.video = None;
        self.cursor.reset();
        self.gate.clear();
        self.draft_s = None;
        self.epoch += 1;
        self.generation += 1;
        self.epoch
    }

    /// Installs a completed session load, unless it is stale. The
    /// selection is pruned against the new catalog; if nothing survives,
    /// the first catalog metric is selected so the chart is never empty
    /// when the session has data.
    pub fn install_session(
        &mut self,
        epoch: u64,
        catalog: SeriesCatalog,
        meta: HashMap<String, MetricMeta>,
        phases: Vec<Phase>,
        video: Option<VideoInfo>,
    ) -> bool {
        if epoch != self.epoch {
            tracing::debug!(
                "discarding stale session load (epoch {} != {})",
                epoch,
                self.epoch
            );
            return false;
        }
        self.selection.retain_known(&catalog.metrics);
        if self.selection.selected().is_empty() {
            if let Some(first) = catalog.metrics.first() {
                self.selection.toggle(first);
            }
        }
        self.catalog = catalog;
        self.meta = meta;
        self.phases = phases;
        self.video = video;
        true
    }

    /// Starts a resolve round for the current selection: bumps the
    /// generation (invalidating any in-flight round) and returns what to
    /// fetch. An empty selection clears the series instead, with nothing
    /// to fetch.
    pub fn begin_resolve(&mut self) -> Option<(u64, Vec<String>)> {
        self.generation += 1;
        if self.selection.selected().is_empty() {
            self.series.clear();
            return None;
        }
        Some((self.generation, self.selection.selected().to_vec()))
    }

    /// Installs resolved series, unless the round went stale.
    pub fn install_series(
        &mut self,
        generation: u64,
        series: HashMap<String, Arc<PointSeries>>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "discarding stale resolve (generation {} != {})",
                generation,
                self.generation
            );
            return false;
        }
        self.series = series;
        true
    }

    pub fn toggle_metric(&mut self, metric: &str) {
        self.selection.toggle(metric);
    }

    pub fn set_selection(&mut self, metrics: &[String]) {
        self.selection.set_selection(metrics);
    }

    pub fn remove_metric(&mut self, metric: &str) {
        self.selection.remove(metric);
    }

    pub fn reorder_tray(&mut self, from: usize, to: usize) {
        self.selection.reorder(from, to);
    }

    pub fn hover(&mut self, t_ms: i64) {
        self.gate.submit(t_ms);
    }

    /// Slider drag: snaps the cursor immediately and drops any hover still
    /// waiting on the gate.
    pub fn set_cursor(&mut self, t_ms: i64) {
        self.gate.clear();
        self.cursor.set_direct(t_ms, self.max_observed_ms());
    }

    pub fn set_smoothing(&mut self, on: bool) {
        self.smooth_on = on;
    }

    pub fn draft(&mut self, x0_s: f64, x1_s: f64) {
        self.draft_s = Some((x0_s, x1_s));
    }

    pub fn clear_draft(&mut self) {
        self.draft_s = None;
    }

    /// Draft bounds as ordered milliseconds, if a draft exists.
    pub fn draft_ms(&self) -> Option<(i64, i64)> {
        self.draft_s.map(|(x0, x1)| draft_bounds_ms(x0, x1))
    }

    /// Installs the refreshed phase list after a successful save and
    /// retires the draft.
    pub fn phases_saved(&mut self, phases: Vec<Phase>) {
        self.phases = phases;
        self.draft_s = None;
    }

    /// Applies at most one coalesced hover per tick.
    pub fn frame_tick(&mut self) {
        if let Some(t_ms) = self.gate.take() {
            self.cursor.apply_hover(t_ms, self.max_observed_ms());
        }
    }

    fn max_observed_ms(&self) -> i64 {
        self.series
            .values()
            .filter_map(|s| s.last_time_ms())
            .max()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let cursor_ms = self.cursor.time_ms();

        let cards = self
            .selection
            .tray()
            .iter()
            .enumerate()
            .map(|(i, metric)| {
                let dimmed = !self.selection.is_selected(metric);
                let value = if dimmed {
                    None
                } else {
                    self.series.get(metric).and_then(|s| s.value_at(cursor_ms))
                };
                CardPayload {
                    metric: metric.clone(),
                    label: metric_label(metric, self.meta.get(metric)),
                    color: color_for(self.meta.get(metric), i),
                    dimmed,
                    value,
                }
            })
            .collect();

        let chart = build_chart(
            self.selection.selected(),
            &self.series,
            &self.meta,
            &self.phases,
            self.smooth_on,
            Some(cursor_ms),
            self.draft_s,
        );
        let stats = build_stat_rows(
            self.selection.selected(),
            &self.series,
            &self.meta,
            &self.phases,
        );

        ViewSnapshot {
            session_id: self.session_id.clone(),
            metrics: self.catalog.metrics.clone(),
            auto_level: self.catalog.auto_level,
            selected: self.selection.selected().to_vec(),
            tray: self.selection.tray().to_vec(),
            cursor_ms,
            smooth: self.smooth_on,
            phases: self.phases.clone(),
            video: self.video.clone(),
            cards,
            chart,
            stats,
        }
    }
}

impl Default for SessionView {
    fn default() -> Self {
        Self::new()
    }
}

/// Client handle to a running view actor.
#[derive(Clone)]
pub struct ViewHandle {
    tx: mpsc::Sender<ViewCommand>,
}

impl ViewHandle {
    /// Applies one event. `false` means the actor is gone.
    pub async fn apply(&self, event: ViewEvent) -> bool {
        self.tx.send(ViewCommand::Apply(event)).await.is_ok()
    }

    pub async fn snapshot(&self) -> Option<ViewSnapshot> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(ViewCommand::Snapshot(reply)).await.is_err() {
            return None;
        }
        rx.await.ok()
    }

    /// Stops the actor, dropping any pending frame work with it.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(ViewCommand::Shutdown).await;
    }
}

/// Spawns the actor task for one view and returns its handle.
pub fn spawn_view(
    service: ViewService,
    athletes: AthleteService,
    frame_interval: Duration,
) -> ViewHandle {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(run_view(service, athletes, tx.clone(), rx, frame_interval));
    ViewHandle { tx }
}

async fn run_view(
    service: ViewService,
    athletes: AthleteService,
    tx: mpsc::Sender<ViewCommand>,
    mut rx: mpsc::Receiver<ViewCommand>,
    frame_interval: Duration,
) {
    let mut view = SessionView::new();
    // tokio's interval panics on a zero period.
    let period = frame_interval.max(Duration::from_millis(1));
    let mut frames = IntervalStream::new(tokio::time::interval(period));

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                None | Some(ViewCommand::Shutdown) => break,
                Some(ViewCommand::Apply(event)) => {
                    apply_event(&mut view, event, &service, &athletes, &tx).await;
                }
                Some(ViewCommand::SessionLoaded { epoch, catalog, meta, phases, video }) => {
                    if view.install_session(epoch, catalog, meta, phases, video) {
                        start_resolve(&mut view, &service, &tx);
                    }
                }
                Some(ViewCommand::Resolved { generation, series }) => {
                    view.install_series(generation, series);
                }
                Some(ViewCommand::Snapshot(reply)) => {
                    let _ = reply.send(view.snapshot());
                }
            },
            _ = frames.next() => view.frame_tick(),
        }
    }

    tracing::debug!("view for session '{}' shut down", view.session_id());
}

async fn apply_event(
    view: &mut SessionView,
    event: ViewEvent,
    service: &ViewService,
    athletes: &AthleteService,
    tx: &mpsc::Sender<ViewCommand>,
) {
    match event {
        ViewEvent::EnterSession { session_id } => {
            let epoch = view.enter_session(&session_id);
            start_session_load(session_id, epoch, service.clone(), athletes.clone(), tx.clone());
        }
        ViewEvent::ToggleMetric { metric } => {
            view.toggle_metric(&metric);
            start_resolve(view, service, tx);
        }
        ViewEvent::SetSelection { metrics } => {
            view.set_selection(&metrics);
            start_resolve(view, service, tx);
        }
        ViewEvent::RemoveMetric { metric } => {
            view.remove_metric(&metric);
            start_resolve(view, service, tx);
        }
        ViewEvent::ReorderTray { from, to } => view.reorder_tray(from, to),
        ViewEvent::Hover { t_ms } => view.hover(t_ms),
        ViewEvent::SetCursor { t_ms } => view.set_cursor(t_ms),
        ViewEvent::SetSmoothing { on } => view.set_smoothing(on),
        ViewEvent::DraftPhase { x0_s, x1_s } => view.draft(x0_s, x1_s),
        ViewEvent::ClearDraft => view.clear_draft(),
        ViewEvent::SavePhase { name } => save_phase(view, &name, service).await,
    }
}

/// Saving needs a complete draft and a non-blank name; anything else is
/// ignored. The await happens inside the actor, so no other event can
/// interleave with the write.
async fn save_phase(view: &mut SessionView, name: &str, service: &ViewService) {
    let name = name.trim();
    let Some((start_ms, end_ms)) = view.draft_ms() else {
        tracing::debug!("phase save ignored: no draft");
        return;
    };
    if name.is_empty() {
        tracing::debug!("phase save ignored: blank name");
        return;
    }
    match service
        .save_phase(view.session_id(), name, start_ms, end_ms)
        .await
    {
        Ok(phases) => view.phases_saved(phases),
        Err(e) => tracing::warn!(
            "phase save failed for session {}: {}",
            view.session_id(),
            e
        ),
    }
}

fn start_resolve(view: &mut SessionView, service: &ViewService, tx: &mpsc::Sender<ViewCommand>) {
    let Some((generation, metrics)) = view.begin_resolve() else {
        return;
    };
    let resolver = service.resolver().clone();
    let session_id = view.session_id().to_string();
    let tx = tx.clone();
    tokio::spawn(async move {
        let series = resolver.resolve(&session_id, &metrics).await;
        let _ = tx.send(ViewCommand::Resolved { generation, series }).await;
    });
}

fn start_session_load(
    session_id: String,
    epoch: u64,
    service: ViewService,
    athletes: AthleteService,
    tx: mpsc::Sender<ViewCommand>,
) {
    tokio::spawn(async move {
        let (catalog, meta) = service.catalog(&session_id, None).await;
        let phases = service.phases(&session_id).await;
        let video = athletes.session(&session_id).await.and_then(|s| s.video);
        let _ = tx
            .send(ViewCommand::SessionLoaded {
                epoch,
                catalog,
                meta,
                phases,
                video,
            })
            .await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::SamplePoint;

    fn series_map(entries: &[(&str, &[(i64, f64)])]) -> HashMap<String, Arc<PointSeries>> {
        entries
            .iter()
            .map(|(metric, points)| {
                (
                    metric.to_string(),
                    Arc::new(PointSeries::new(
                        points.iter().map(|&(t, v)| SamplePoint::new(t, v)).collect(),
                    )),
                )
            })
            .collect()
    }

    fn catalog_of(metrics: &[&str]) -> SeriesCatalog {
        SeriesCatalog {
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            auto_level: Some(0),
        }
    }

    #[test]
    fn test_enter_session_clears_session_state() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        let (generation, _) = view.begin_resolve().unwrap();
        assert!(view.install_series(generation, series_map(&[("hip", &[(0, 1.0), (100, 2.0)])])));
        view.hover(50);
        view.frame_tick();
        view.draft(1.0, 2.0);

        view.enter_session("s2");
        let snap = view.snapshot();
        assert_eq!(snap.session_id, "s2");
        assert_eq!(snap.cursor_ms, 0);
        assert!(snap.chart.series.is_empty());
        assert!(view.draft_ms().is_none());
        // Selection is kept until the new catalog says otherwise.
        assert_eq!(snap.selected, ["hip".to_string()]);
    }

    #[test]
    fn test_stale_session_load_is_discarded() {
        let mut view = SessionView::new();
        let first = view.enter_session("s1");
        let second = view.enter_session("s2");

        assert!(!view.install_session(
            first,
            catalog_of(&["hip"]),
            HashMap::new(),
            Vec::new(),
            None
        ));
        assert!(view.snapshot().metrics.is_empty());

        assert!(view.install_session(
            second,
            catalog_of(&["knee"]),
            HashMap::new(),
            Vec::new(),
            None
        ));
        assert_eq!(view.snapshot().metrics, ["knee".to_string()]);
    }

    #[test]
    fn test_stale_resolve_is_discarded() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        let (old_gen, _) = view.begin_resolve().unwrap();
        let (new_gen, _) = view.begin_resolve().unwrap();

        assert!(!view.install_series(old_gen, series_map(&[("hip", &[(0, 9.0)])])));
        assert!(view.snapshot().chart.series.is_empty());

        assert!(view.install_series(new_gen, series_map(&[("hip", &[(0, 1.0)])])));
        assert_eq!(view.snapshot().chart.series.len(), 1);
    }

    #[test]
    fn test_session_switch_invalidates_inflight_resolve() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        let (generation, _) = view.begin_resolve().unwrap();

        view.enter_session("s2");
        assert!(!view.install_series(generation, series_map(&[("hip", &[(0, 9.0)])])));
    }

    #[test]
    fn test_empty_selection_clears_series_without_a_fetch() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        let (generation, _) = view.begin_resolve().unwrap();
        assert!(view.install_series(generation, series_map(&[("hip", &[(0, 1.0)])])));

        view.toggle_metric("hip");
        assert!(view.begin_resolve().is_none());
        assert!(view.snapshot().chart.series.is_empty());
        // The cleared round still advanced the generation.
        assert!(!view.install_series(generation + 1, series_map(&[("hip", &[(0, 9.0)])])));
    }

    #[test]
    fn test_install_session_prunes_unknown_selection() {
        let mut view = SessionView::new();
        let epoch = view.enter_session("s1");
        view.toggle_metric("hip");
        view.toggle_metric("gone");

        assert!(view.install_session(
            epoch,
            catalog_of(&["hip", "knee"]),
            HashMap::new(),
            Vec::new(),
            None
        ));
        let snap = view.snapshot();
        assert_eq!(snap.selected, ["hip".to_string()]);
        assert_eq!(snap.tray, ["hip".to_string()]);
    }

    #[test]
    fn test_install_session_autoselects_the_first_metric() {
        let mut view = SessionView::new();
        let epoch = view.enter_session("s1");

        assert!(view.install_session(
            epoch,
            catalog_of(&["hip", "knee"]),
            HashMap::new(),
            Vec::new(),
            None
        ));
        let snap = view.snapshot();
        assert_eq!(snap.selected, ["hip".to_string()]);
        assert_eq!(snap.tray, ["hip".to_string()]);

        // A selection that fully vanishes on session switch also falls
        // back to the first metric.
        view.toggle_metric("knee");
        let epoch = view.enter_session("s2");
        view.install_session(epoch, catalog_of(&["grf"]), HashMap::new(), Vec::new(), None);
        assert_eq!(view.snapshot().selected, ["grf".to_string()]);
    }

    #[test]
    fn test_frame_tick_applies_only_the_latest_hover() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        let (generation, _) = view.begin_resolve().unwrap();
        view.install_series(generation, series_map(&[("hip", &[(0, 0.0), (1000, 10.0)])]));

        view.hover(100);
        view.hover(200);
        view.hover(300);
        view.frame_tick();
        assert_eq!(view.snapshot().cursor_ms, 300);

        // Nothing pending on the next tick.
        view.frame_tick();
        assert_eq!(view.snapshot().cursor_ms, 300);
    }

    #[test]
    fn test_hover_clamps_to_the_observed_span() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        let (generation, _) = view.begin_resolve().unwrap();
        view.install_series(generation, series_map(&[("hip", &[(0, 0.0), (800, 1.0)])]));

        view.hover(5000);
        view.frame_tick();
        assert_eq!(view.snapshot().cursor_ms, 800);
    }

    #[test]
    fn test_slider_write_drops_the_pending_hover() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        let (generation, _) = view.begin_resolve().unwrap();
        view.install_series(generation, series_map(&[("hip", &[(0, 0.0), (1000, 1.0)])]));

        view.hover(900);
        view.set_cursor(200);
        view.frame_tick();
        assert_eq!(view.snapshot().cursor_ms, 200);
    }

    #[test]
    fn test_cards_dim_and_lose_their_readout_when_deselected() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        view.toggle_metric("knee");
        let (generation, _) = view.begin_resolve().unwrap();
        view.install_series(
            generation,
            series_map(&[
                ("hip", &[(0, 0.0), (100, 10.0)]),
                ("knee", &[(0, 5.0), (100, 5.0)]),
            ]),
        );
        view.hover(50);
        view.frame_tick();
        view.toggle_metric("knee");

        let snap = view.snapshot();
        assert_eq!(snap.cards.len(), 2);
        assert_eq!(snap.cards[0].metric, "hip");
        assert!(!snap.cards[0].dimmed);
        assert_eq!(snap.cards[0].value, Some(5.0));
        assert_eq!(snap.cards[1].metric, "knee");
        assert!(snap.cards[1].dimmed);
        assert_eq!(snap.cards[1].value, None);
        // Only the selected metric is plotted.
        assert_eq!(snap.chart.series.len(), 1);
    }

    #[test]
    fn test_cards_read_at_time_zero_before_any_hover() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.toggle_metric("hip");
        let (generation, _) = view.begin_resolve().unwrap();
        view.install_series(generation, series_map(&[("hip", &[(0, 1.0), (100, 3.0)])]));

        assert_eq!(view.snapshot().cursor_ms, 0);
        assert_eq!(view.snapshot().cards[0].value, Some(1.0));
    }

    #[test]
    fn test_draft_lifecycle() {
        let mut view = SessionView::new();
        view.enter_session("s1");
        view.draft(2.5, 1.0);
        assert_eq!(view.draft_ms(), Some((1000, 2500)));

        view.phases_saved(vec![Phase::new("stance", 1000, 2500)]);
        assert!(view.draft_ms().is_none());
        assert_eq!(view.snapshot().phases.len(), 1);

        view.draft(0.0, 1.0);
        view.clear_draft();
        assert!(view.draft_ms().is_none());
    }

    #[test]
    fn test_stats_follow_the_selection() {
        let mut view = SessionView::new();
        let epoch = view.enter_session("s1");
        view.toggle_metric("hip");
        view.install_session(
            epoch,
            catalog_of(&["hip"]),
            HashMap::new(),
            vec![Phase::new("stance", 0, 100)],
            None,
        );
        let (generation, _) = view.begin_resolve().unwrap();
        view.install_series(generation, series_map(&[("hip", &[(0, 2.0), (100, 4.0)])]));

        let snap = view.snapshot();
        assert_eq!(snap.stats.len(), 1);
        assert_eq!(snap.stats[0].mean, Some(3.0));
        assert_eq!(snap.stats[0].phase, "stance");
    }

    use crate::application::series_resolver::SeriesResolver;
    use crate::application::stores::{
        AthleteStore, ColumnarRow, MetaStore, PhaseStore, SampleRow, SeriesKey, SeriesStore,
        StoreResult, StructuredRow,
    };
    use crate::domain::session::{Athlete, Session};
    use async_trait::async_trait;

    /// All four store traits over in-memory tables.
    #[derive(Default)]
    struct FakeStores {
        columnar: Vec<(String, i64, Vec<i64>, Vec<f64>)>,
        phases: std::sync::Mutex<Vec<Phase>>,
    }

    #[async_trait]
    impl SeriesStore for FakeStores {
        async fn columnar_index(&self, _session_id: &str) -> StoreResult<Vec<SeriesKey>> {
            Ok(self
                .columnar
                .iter()
                .map(|(metric, level, _, _)| SeriesKey {
                    metric: metric.clone(),
                    level: *level,
                })
                .collect())
        }

        async fn structured_index(&self, _session_id: &str) -> StoreResult<Vec<SeriesKey>> {
            Ok(Vec::new())
        }

        async fn sample_index(&self, _session_id: &str) -> StoreResult<Vec<SeriesKey>> {
            Ok(Vec::new())
        }

        async fn columnar_rows(
            &self,
            _session_id: &str,
            level: i64,
            metrics: &[String],
        ) -> StoreResult<Vec<ColumnarRow>> {
            Ok(self
                .columnar
                .iter()
                .filter(|(metric, l, _, _)| *l == level && metrics.contains(metric))
                .map(|(metric, _, ts, vs)| ColumnarRow {
                    metric: metric.clone(),
                    t_ms: Some(ts.clone()),
                    values: Some(vs.clone()),
                })
                .collect())
        }

        async fn structured_rows(
            &self,
            _session_id: &str,
            _level: i64,
            _metrics: &[String],
        ) -> StoreResult<Vec<StructuredRow>> {
            Ok(Vec::new())
        }

        async fn sample_rows(
            &self,
            _session_id: &str,
            _metrics: &[String],
        ) -> StoreResult<Vec<SampleRow>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl MetaStore for FakeStores {
        async fn metric_meta(&self, _metrics: &[String]) -> StoreResult<Vec<MetricMeta>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl PhaseStore for FakeStores {
        async fn list_phases(&self, _session_id: &str) -> StoreResult<Vec<Phase>> {
            Ok(self.phases.lock().unwrap().clone())
        }

        async fn insert_phase(&self, _session_id: &str, phase: &Phase) -> StoreResult<()> {
            self.phases.lock().unwrap().push(phase.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl AthleteStore for FakeStores {
        async fn list_athletes(&self) -> StoreResult<Vec<Athlete>> {
            Ok(Vec::new())
        }

        async fn list_sessions(&self, _athlete_id: &str) -> StoreResult<Vec<Session>> {
            Ok(Vec::new())
        }

        async fn get_session(&self, _session_id: &str) -> StoreResult<Option<Session>> {
            Ok(None)
        }
    }

    async fn wait_for(
        handle: &ViewHandle,
        pred: impl Fn(&ViewSnapshot) -> bool,
    ) -> ViewSnapshot {
        for _ in 0..200 {
            if let Some(snap) = handle.snapshot().await {
                if pred(&snap) {
                    return snap;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("view never reached the expected state");
    }

    #[tokio::test]
    async fn test_view_actor_end_to_end() {
        let store = Arc::new(FakeStores {
            columnar: vec![(
                "hip".to_string(),
                1,
                vec![0, 100, 200],
                vec![0.0, 10.0, 0.0],
            )],
            ..Default::default()
        });
        let resolver = SeriesResolver::new(store.clone());
        let view_service = ViewService::new(resolver, store.clone(), store.clone());
        let athletes = AthleteService::new(store.clone());
        let handle = spawn_view(view_service, athletes, Duration::from_millis(1));

        handle
            .apply(ViewEvent::EnterSession {
                session_id: "s1".to_string(),
            })
            .await;
        let snap = wait_for(&handle, |s| !s.metrics.is_empty()).await;
        assert_eq!(snap.metrics, ["hip".to_string()]);
        assert_eq!(snap.auto_level, Some(1));
        // The only metric was selected for us.
        assert_eq!(snap.selected, ["hip".to_string()]);

        let snap = wait_for(&handle, |s| !s.chart.series.is_empty()).await;
        assert_eq!(snap.chart.series[0].y, vec![0.0, 10.0, 0.0]);

        handle.apply(ViewEvent::Hover { t_ms: 150 }).await;
        let snap = wait_for(&handle, |s| s.cursor_ms == 150).await;
        // Interpolated readout halfway between the 100ms and 200ms samples.
        assert_eq!(snap.cards[0].value, Some(5.0));

        handle
            .apply(ViewEvent::DraftPhase {
                x0_s: 0.2,
                x1_s: 0.05,
            })
            .await;
        handle
            .apply(ViewEvent::SavePhase {
                name: "stance".to_string(),
            })
            .await;
        let snap = wait_for(&handle, |s| !s.phases.is_empty()).await;
        assert_eq!(snap.phases[0].name, "stance");
        assert_eq!(snap.phases[0].start_ms, 50);
        assert_eq!(snap.phases[0].end_ms, 200);
        assert_eq!(snap.stats.len(), 1);

        handle.shutdown().await;
        assert!(handle.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_view_actor_survives_a_zero_frame_interval() {
        let store = Arc::new(FakeStores {
            columnar: vec![("hip".to_string(), 1, vec![0, 100], vec![0.0, 10.0])],
            ..Default::default()
        });
        let resolver = SeriesResolver::new(store.clone());
        let view_service = ViewService::new(resolver, store.clone(), store.clone());
        let athletes = AthleteService::new(store.clone());
        let handle = spawn_view(view_service, athletes, Duration::ZERO);

        handle
            .apply(ViewEvent::EnterSession {
                session_id: "s1".to_string(),
            })
            .await;
        let snap = wait_for(&handle, |s| !s.chart.series.is_empty()).await;
        assert_eq!(snap.selected, ["hip".to_string()]);

        // Hovers still reach the cursor, so the gate is ticking.
        handle.apply(ViewEvent::Hover { t_ms: 60 }).await;
        let snap = wait_for(&handle, |s| s.cursor_ms == 60).await;
        assert_eq!(snap.cards[0].value, Some(6.0));
    }
}

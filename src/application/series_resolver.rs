// LOD resolver - Normalizes three storage shapes into point series
use crate::application::stores::{ColumnarRow, SampleRow, SeriesKey, SeriesStore, StructuredRow};
use crate::domain::series::{PointSeries, SamplePoint};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Metric names and auto level discovered for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesCatalog {
    /// Sorted, deduplicated metric names.
    pub metrics: Vec<String>,
    /// Maximum level present across all metrics, `None` when the session
    /// has no series data in any shape.
    pub auto_level: Option<i64>,
}

/// Resolves point series out of whichever of the three storage layouts
/// holds a session's data, always at the finest available discretization.
///
/// Pure query-and-normalize: no state, safe to re-invoke whenever the
/// requested metric set changes. Store failures behave like a missing
/// shape (logged, then the next shape is tried).
#[derive(Clone)]
pub struct SeriesResolver {
    store: Arc<dyn SeriesStore>,
}

impl SeriesResolver {
    pub fn new(store: Arc<dyn SeriesStore>) -> Self {
        Self { store }
    }

    /// Lists the metrics a session exposes, trying the three shapes in
    /// priority order and stopping at the first with any index rows.
    pub async fn discover(&self, session_id: &str) -> SeriesCatalog {
        let keys = self.degraded(self.store.columnar_index(session_id).await, "columnar index", session_id);
        if !keys.is_empty() {
            return catalog_from_keys(&keys);
        }
        let keys = self.degraded(
            self.store.structured_index(session_id).await,
            "structured index",
            session_id,
        );
        if !keys.is_empty() {
            return catalog_from_keys(&keys);
        }
        let keys = self.degraded(self.store.sample_index(session_id).await, "sample index", session_id);
        if !keys.is_empty() {
            return catalog_from_keys(&keys);
        }
        tracing::debug!("no series data in any shape for session {}", session_id);
        SeriesCatalog::default()
    }

    /// Resolves the requested metrics into point series.
    ///
    /// Shapes are tried in strict priority order; a shape that yields zero
    /// rows is a miss, not a success. Metrics absent from the session are
    /// silently omitted. Exhausting all three shapes yields an empty map,
    /// never an error.
    pub async fn resolve(
        &self,
        session_id: &str,
        metrics: &[String],
    ) -> HashMap<String, Arc<PointSeries>> {
        if metrics.is_empty() {
            return HashMap::new();
        }

        // Columnar-per-level: one auto level chosen across the whole session.
        let keys = self.degraded(self.store.columnar_index(session_id).await, "columnar index", session_id);
        if let Some(level) = max_level(&keys) {
            let rows = self.degraded(
                self.store.columnar_rows(session_id, level, metrics).await,
                "columnar rows",
                session_id,
            );
            if !rows.is_empty() {
                let out = zip_columnar(rows);
                tracing::debug!(
                    "resolved {} series from columnar shape at level {} for session {}",
                    out.len(),
                    level,
                    session_id
                );
                return out;
            }
        }

        // Structured-columnar: same semantics, arrays nested under `data`.
        let keys = self.degraded(
            self.store.structured_index(session_id).await,
            "structured index",
            session_id,
        );
        if let Some(level) = max_level(&keys) {
            let rows = self.degraded(
                self.store.structured_rows(session_id, level, metrics).await,
                "structured rows",
                session_id,
            );
            if !rows.is_empty() {
                let out = zip_structured(rows);
                tracing::debug!(
                    "resolved {} series from structured shape at level {} for session {}",
                    out.len(),
                    level,
                    session_id
                );
                return out;
            }
        }

        // Row-per-sample fallback: levels may differ per metric here.
        let rows = self.degraded(
            self.store.sample_rows(session_id, metrics).await,
            "sample rows",
            session_id,
        );
        if !rows.is_empty() {
            let out = group_samples(rows);
            tracing::debug!(
                "resolved {} series from sample shape for session {}",
                out.len(),
                session_id
            );
            return out;
        }

        tracing::debug!("no rows in any shape for session {}", session_id);
        HashMap::new()
    }

    fn degraded<T>(
        &self,
        result: Result<Vec<T>, crate::application::stores::StoreError>,
        what: &str,
        session_id: &str,
    ) -> Vec<T> {
        match result {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("{} query failed for session {}: {}", what, session_id, e);
                Vec::new()
            }
        }
    }
}

fn catalog_from_keys(keys: &[SeriesKey]) -> SeriesCatalog {
    let metrics: BTreeSet<&str> = keys.iter().map(|k| k.metric.as_str()).collect();
    SeriesCatalog {
        metrics: metrics.into_iter().map(str::to_string).collect(),
        auto_level: max_level(keys),
    }
}

fn max_level(keys: &[SeriesKey]) -> Option<i64> {
    keys.iter().map(|k| k.level).max()
}

/// Zips parallel time/value arrays into a series. A length mismatch is
/// tolerated by truncating to the shorter array.
fn zip_arrays(t_ms: &[i64], values: &[f64]) -> PointSeries {
    PointSeries::new(
        t_ms.iter()
            .zip(values.iter())
            .map(|(&t, &v)| SamplePoint::new(t, v))
            .collect(),
    )
}

fn zip_columnar(rows: Vec<ColumnarRow>) -> HashMap<String, Arc<PointSeries>> {
    rows.into_iter()
        .map(|row| {
            let ts = row.t_ms.unwrap_or_default();
            let vs = row.values.unwrap_or_default();
            (row.metric, Arc::new(zip_arrays(&ts, &vs)))
        })
        .collect()
}

fn zip_structured(rows: Vec<StructuredRow>) -> HashMap<String, Arc<PointSeries>> {
    rows.into_iter()
        .map(|row| {
            let arrays = row.data.unwrap_or_default();
            let ts = arrays.t_ms.unwrap_or_default();
            let vs = arrays.values.unwrap_or_default();
            (row.metric, Arc::new(zip_arrays(&ts, &vs)))
        })
        .collect()
}

/// Groups flat sample rows into series, keeping only each metric's maximum
/// level and ordering by time.
fn group_samples(rows: Vec<SampleRow>) -> HashMap<String, Arc<PointSeries>> {
    let mut best_level: HashMap<String, i64> = HashMap::new();
    for row in &rows {
        best_level
            .entry(row.metric.clone())
            .and_modify(|l| *l = (*l).max(row.level))
            .or_insert(row.level);
    }

    let mut grouped: HashMap<String, Vec<SamplePoint>> = HashMap::new();
    for row in rows {
        if best_level.get(&row.metric) == Some(&row.level) {
            grouped
                .entry(row.metric)
                .or_default()
                .push(SamplePoint::new(row.t_ms, row.value));
        }
    }

    grouped
        .into_iter()
        .map(|(metric, points)| (metric, Arc::new(PointSeries::from_unordered(points))))
        .collect()
}

// Repository traits for session data access
use crate::domain::metric::MetricMeta;
use crate::domain::phase::Phase;
use crate::domain::session::{Athlete, Session};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Store failures are logged and degraded to empty results by the callers;
/// the typed split exists so the logs can tell transport problems apart
/// from bad payloads.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store returned status {status} for {table}: {detail}")]
    Status {
        table: &'static str,
        status: u16,
        detail: String,
    },
    #[error("store row decode failed for {table}: {source}")]
    Decode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One `(metric, level)` index entry, common to all three storage shapes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeriesKey {
    pub metric: String,
    pub level: i64,
}

/// Columnar-per-level shape: parallel time/value arrays as top-level fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnarRow {
    pub metric: String,
    #[serde(default)]
    pub t_ms: Option<Vec<i64>>,
    #[serde(default)]
    pub values: Option<Vec<f64>>,
}

/// Structured-columnar shape: the same parallel arrays nested in a `data`
/// sub-object.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredRow {
    pub metric: String,
    #[serde(default)]
    pub data: Option<SeriesArrays>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesArrays {
    #[serde(default)]
    pub t_ms: Option<Vec<i64>>,
    #[serde(default)]
    pub values: Option<Vec<f64>>,
}

/// Row-per-sample shape: one row per (metric, level, time, value).
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRow {
    pub metric: String,
    pub level: i64,
    pub t_ms: i64,
    pub value: f64,
}

#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// `(metric, level)` pairs present in the columnar shape for a session.
    async fn columnar_index(&self, session_id: &str) -> StoreResult<Vec<SeriesKey>>;

    /// `(metric, level)` pairs present in the structured-columnar shape.
    async fn structured_index(&self, session_id: &str) -> StoreResult<Vec<SeriesKey>>;

    /// `(metric, level)` pairs present in the row-per-sample shape.
    async fn sample_index(&self, session_id: &str) -> StoreResult<Vec<SeriesKey>>;

    /// Columnar rows at one level, restricted to the given metric names.
    async fn columnar_rows(
        &self,
        session_id: &str,
        level: i64,
        metrics: &[String],
    ) -> StoreResult<Vec<ColumnarRow>>;

    /// Structured rows at one level, restricted to the given metric names.
    async fn structured_rows(
        &self,
        session_id: &str,
        level: i64,
        metrics: &[String],
    ) -> StoreResult<Vec<StructuredRow>>;

    /// Flat sample rows for the given metrics at every stored level,
    /// ordered by time.
    async fn sample_rows(&self, session_id: &str, metrics: &[String])
    -> StoreResult<Vec<SampleRow>>;
}

#[async_trait]
pub trait MetaStore: Send + Sync {
    /// Metadata rows for the given metric names. Absent rows are not an
    /// error; callers degrade to the raw metric name.
    async fn metric_meta(&self, metrics: &[String]) -> StoreResult<Vec<MetricMeta>>;
}

#[async_trait]
pub trait PhaseStore: Send + Sync {
    async fn list_phases(&self, session_id: &str) -> StoreResult<Vec<Phase>>;

    async fn insert_phase(&self, session_id: &str, phase: &Phase) -> StoreResult<()>;
}

#[async_trait]
pub trait AthleteStore: Send + Sync {
    async fn list_athletes(&self) -> StoreResult<Vec<Athlete>>;

    /// Sessions for one athlete, newest first.
    async fn list_sessions(&self, athlete_id: &str) -> StoreResult<Vec<Session>>;

    async fn get_session(&self, session_id: &str) -> StoreResult<Option<Session>>;
}

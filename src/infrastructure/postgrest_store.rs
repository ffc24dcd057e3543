// PostgREST store implementation
use crate::application::stores::{
    AthleteStore, ColumnarRow, MetaStore, PhaseStore, SampleRow, SeriesKey, SeriesStore,
    StoreError, StoreResult, StructuredRow,
};
use crate::domain::metric::MetricMeta;
use crate::domain::phase::Phase;
use crate::domain::session::{Athlete, Session};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct PostgrestStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct NewPhaseRow<'a> {
    session_id: &'a str,
    name: &'a str,
    start_ms: i64,
    end_ms: i64,
}

impl PostgrestStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str, filters: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.base_url, table, filters)
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &'static str,
        filters: String,
    ) -> StoreResult<Vec<T>> {
        let url = self.table_url(table, &filters);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                table,
                status: status.as_u16(),
                detail,
            });
        }

        let body = response.text().await?;
        let rows: Vec<T> =
            serde_json::from_str(&body).map_err(|source| StoreError::Decode { table, source })?;
        tracing::debug!("{}: {} rows", table, rows.len());
        Ok(rows)
    }
}

/// `column=eq.value` filter with the value URL-encoded.
fn eq_filter(column: &str, value: &str) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(value))
}

/// `column=in.("a","b")` filter. Values are double-quoted so names with
/// reserved characters survive; embedded quotes are stripped to keep the
/// filter well-formed.
fn in_filter(column: &str, values: &[String]) -> String {
    let list = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "")))
        .collect::<Vec<_>>()
        .join(",");
    format!("{}=in.({})", column, urlencoding::encode(&list))
}

// One pure (table, filters) builder per read; the tests hold these to the
// backend schema.

fn athletes_query() -> (&'static str, String) {
    ("athletes", "select=*&order=name.asc".to_string())
}

fn sessions_query(athlete_id: &str) -> (&'static str, String) {
    (
        "sessions",
        format!(
            "select=*&{}&order=date.desc",
            eq_filter("athlete_id", athlete_id)
        ),
    )
}

fn session_by_id_query(session_id: &str) -> (&'static str, String) {
    (
        "sessions",
        format!("select=*&{}&limit=1", eq_filter("id", session_id)),
    )
}

fn columnar_index_query(session_id: &str) -> (&'static str, String) {
    (
        "series_lod",
        format!("select=metric,level&{}", eq_filter("session_id", session_id)),
    )
}

fn structured_index_query(session_id: &str) -> (&'static str, String) {
    (
        "series_lod_json",
        format!("select=metric,level&{}", eq_filter("session_id", session_id)),
    )
}

fn sample_index_query(session_id: &str) -> (&'static str, String) {
    (
        "timeseries_lod",
        format!("select=metric,level&{}", eq_filter("session_id", session_id)),
    )
}

fn columnar_rows_query(session_id: &str, level: i64, metrics: &[String]) -> (&'static str, String) {
    (
        "series_lod",
        format!(
            "select=metric,t_ms,values&{}&level=eq.{}&{}",
            eq_filter("session_id", session_id),
            level,
            in_filter("metric", metrics)
        ),
    )
}

fn structured_rows_query(
    session_id: &str,
    level: i64,
    metrics: &[String],
) -> (&'static str, String) {
    (
        "series_lod_json",
        format!(
            "select=metric,data&{}&level=eq.{}&{}",
            eq_filter("session_id", session_id),
            level,
            in_filter("metric", metrics)
        ),
    )
}

fn sample_rows_query(session_id: &str, metrics: &[String]) -> (&'static str, String) {
    (
        "timeseries_lod",
        format!(
            "select=metric,level,t_ms,value&{}&{}&order=t_ms.asc",
            eq_filter("session_id", session_id),
            in_filter("metric", metrics)
        ),
    )
}

fn meta_query(metrics: &[String]) -> (&'static str, String) {
    (
        "metrics_meta",
        format!("select=*&{}", in_filter("metric", metrics)),
    )
}

fn phases_query(session_id: &str) -> (&'static str, String) {
    (
        "phases",
        format!(
            "select=*&{}&order=start_ms.asc",
            eq_filter("session_id", session_id)
        ),
    )
}

#[async_trait]
impl SeriesStore for PostgrestStore {
    async fn columnar_index(&self, session_id: &str) -> StoreResult<Vec<SeriesKey>> {
        let (table, filters) = columnar_index_query(session_id);
        self.get_rows(table, filters).await
    }

    async fn structured_index(&self, session_id: &str) -> StoreResult<Vec<SeriesKey>> {
        let (table, filters) = structured_index_query(session_id);
        self.get_rows(table, filters).await
    }

    async fn sample_index(&self, session_id: &str) -> StoreResult<Vec<SeriesKey>> {
        let (table, filters) = sample_index_query(session_id);
        self.get_rows(table, filters).await
    }

    async fn columnar_rows(
        &self,
        session_id: &str,
        level: i64,
        metrics: &[String],
    ) -> StoreResult<Vec<ColumnarRow>> {
        let (table, filters) = columnar_rows_query(session_id, level, metrics);
        self.get_rows(table, filters).await
    }

    async fn structured_rows(
        &self,
        session_id: &str,
        level: i64,
        metrics: &[String],
    ) -> StoreResult<Vec<StructuredRow>> {
        let (table, filters) = structured_rows_query(session_id, level, metrics);
        self.get_rows(table, filters).await
    }

    async fn sample_rows(
        &self,
        session_id: &str,
        metrics: &[String],
    ) -> StoreResult<Vec<SampleRow>> {
        let (table, filters) = sample_rows_query(session_id, metrics);
        self.get_rows(table, filters).await
    }
}

#[async_trait]
impl MetaStore for PostgrestStore {
    async fn metric_meta(&self, metrics: &[String]) -> StoreResult<Vec<MetricMeta>> {
        let (table, filters) = meta_query(metrics);
        self.get_rows(table, filters).await
    }
}

#[async_trait]
impl PhaseStore for PostgrestStore {
    async fn list_phases(&self, session_id: &str) -> StoreResult<Vec<Phase>> {
        let (table, filters) = phases_query(session_id);
        self.get_rows(table, filters).await
    }

    async fn insert_phase(&self, session_id: &str, phase: &Phase) -> StoreResult<()> {
        let url = self.table_url("phases", "");
        let row = NewPhaseRow {
            session_id,
            name: &phase.name,
            start_ms: phase.start_ms,
            end_ms: phase.end_ms,
        };

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                table: "phases",
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AthleteStore for PostgrestStore {
    async fn list_athletes(&self) -> StoreResult<Vec<Athlete>> {
        let (table, filters) = athletes_query();
        self.get_rows(table, filters).await
    }

    async fn list_sessions(&self, athlete_id: &str) -> StoreResult<Vec<Session>> {
        let (table, filters) = sessions_query(athlete_id);
        self.get_rows(table, filters).await
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Option<Session>> {
        let (table, filters) = session_by_id_query(session_id);
        let rows: Vec<Session> = self.get_rows(table, filters).await?;
        Ok(rows.into_iter().next())
    }
}

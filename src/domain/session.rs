// Athlete and session domain models
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Athlete {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub athlete_id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Session {
    /// Picker label, e.g. `2024-05-12 · sess-41`. Unparseable or missing
    /// dates render as a dash.
    pub fn display_label(&self) -> String {
        format!("{} · {}", self.date_label(), self.id)
    }

    fn date_label(&self) -> String {
        self.date
            .as_deref()
            .and_then(normalize_date)
            .unwrap_or_else(|| "–".to_string())
    }
}

/// Normalizes a stored session date (RFC 3339 timestamp or bare date) to
/// `YYYY-MM-DD`.
fn normalize_date(raw: &str) -> Option<String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive().format("%Y-%m-%d").to_string());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

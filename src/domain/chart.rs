// Chart payload domain model
//
// The chart widget is an external collaborator: it only consumes named line
// series (x in seconds, y in display values) plus overlay shapes and label
// annotations, and raises pointer-hover / shape-edit events back.
use serde::Serialize;

pub const MS_PER_SEC: f64 = 1000.0;

/// Fallback line/card colors when a metric has no stored color.
pub const PALETTE: [&str; 10] = [
    "#60a5fa", "#22d3ee", "#34d399", "#f59e0b", "#f472b6", "#a78bfa", "#fb7185", "#f97316",
    "#84cc16", "#06b6d4",
];

#[derive(Debug, Clone, Serialize)]
pub struct LineSeries {
    pub metric: String,
    pub name: String,
    pub color: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Overlay geometry in chart coordinates (seconds on x, full height on y).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayShape {
    /// Background highlight for a stored phase, half-open bounds as stored.
    PhaseBand { x0: f64, x1: f64 },
    /// The scrubbing cursor.
    CursorLine { x: f64 },
    /// The in-progress phase selection while editing.
    DraftBand { x0: f64, x1: f64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseLabel {
    pub x: f64,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartPayload {
    pub series: Vec<LineSeries>,
    pub shapes: Vec<OverlayShape>,
    pub annotations: Vec<PhaseLabel>,
}

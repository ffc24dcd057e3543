// Phase domain model and per-phase aggregate statistics
use crate::domain::series::PointSeries;
use serde::{Deserialize, Serialize};

/// Named time interval within a session.
///
/// The stored bounds follow the half-open `[start_ms, end_ms)` convention
/// used for overlay rendering. Phases are non-overlapping by convention but
/// nothing enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl Phase {
    pub fn new(name: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            name: name.into(),
            start_ms,
            end_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseStats {
    pub mean: Option<f64>,
    pub peak: Option<f64>,
    pub time_to_peak_ms: Option<i64>,
}

impl PhaseStats {
    pub const EMPTY: PhaseStats = PhaseStats {
        mean: None,
        peak: None,
        time_to_peak_ms: None,
    };
}

/// Aggregates a series over one phase window.
///
/// The slice takes samples with `start_ms <= time_ms <= end_ms`, inclusive
/// on both ends (unlike the half-open convention used for rendering). The
/// mean is unweighted by time gaps, so irregular sampling biases it toward
/// densely sampled regions. Peak ties break to the earliest sample.
pub fn phase_stats(series: &PointSeries, phase: &Phase) -> PhaseStats {
    let seg = series.slice(phase.start_ms, phase.end_ms);
    let Some(first) = seg.first() else {
        return PhaseStats::EMPTY;
    };

    let mut sum = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut peak_t = first.time_ms;
    for p in seg {
        sum += p.value;
        if p.value > peak {
            peak = p.value;
            peak_t = p.time_ms;
        }
    }

    PhaseStats {
        mean: Some(sum / seg.len() as f64),
        peak: Some(peak),
        time_to_peak_ms: Some(peak_t - phase.start_ms),
    }
}

// Point-series domain model
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplePoint {
    pub time_ms: i64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// Ordered samples for one metric, one session, one discretization level.
///
/// `time_ms` is non-decreasing; duplicate timestamps are tolerated and not
/// deduplicated. A series is always replaced wholesale when the session,
/// level, or metric set changes - never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct PointSeries {
    points: Vec<SamplePoint>,
}

impl PointSeries {
    /// Wraps samples that are already ordered by time.
    pub fn new(points: Vec<SamplePoint>) -> Self {
        Self { points }
    }

    /// Sorts samples by time before wrapping them.
    pub fn from_unordered(mut points: Vec<SamplePoint>) -> Self {
        points.sort_by_key(|p| p.time_ms);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Time of the last sample, i.e. the maximum observed time.
    pub fn last_time_ms(&self) -> Option<i64> {
        self.points.last().map(|p| p.time_ms)
    }

    /// Value at an arbitrary query time.
    ///
    /// Clamps to the first/last sample value outside the covered range (no
    /// extrapolation), otherwise binary-searches the bracketing pair and
    /// interpolates linearly between them. O(log n); this runs once per
    /// visible metric on every cursor update.
    pub fn value_at(&self, t_ms: i64) -> Option<f64> {
        let first = self.points.first()?;
        if t_ms <= first.time_ms {
            return Some(first.value);
        }
        let last = self.points.last()?;
        if t_ms >= last.time_ms {
            return Some(last.value);
        }

        let mut lo = 0usize;
        let mut hi = self.points.len() - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.points[mid].time_ms <= t_ms {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let a = self.points[lo];
        let b = self.points[hi];
        if a.time_ms == b.time_ms {
            // Duplicate timestamps: either endpoint is a valid answer.
            return Some(a.value);
        }
        let r = (t_ms - a.time_ms) as f64 / (b.time_ms - a.time_ms) as f64;
        Some(a.value + r * (b.value - a.value))
    }

    /// Samples with `start_ms <= time_ms <= end_ms`, inclusive on both ends.
    ///
    /// This is the statistics slicing rule; phase overlay rendering keeps
    /// the half-open `[start_ms, end_ms)` convention separately.
    pub fn slice(&self, start_ms: i64, end_ms: i64) -> &[SamplePoint] {
        let lo = self.points.partition_point(|p| p.time_ms < start_ms);
        let hi = self.points.partition_point(|p| p.time_ms <= end_ms);
        &self.points[lo..hi.max(lo)]
    }
}

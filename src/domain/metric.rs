// Metric metadata domain model
use serde::{Deserialize, Serialize};

/// Optional display decoration for one metric name. Every field may be
/// absent; consumers degrade to the raw metric name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricMeta {
    pub metric: String,
    pub display_name: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
}

impl MetricMeta {
    /// Display label: `display_name [unit]` with each part degrading to the
    /// raw metric name / no suffix when missing.
    pub fn label(&self) -> String {
        let name = self.display_name.as_deref().unwrap_or(&self.metric);
        match self.unit.as_deref() {
            Some(unit) => format!("{name} [{unit}]"),
            None => name.to_string(),
        }
    }
}

/// Label for a metric that may have no metadata row at all.
pub fn metric_label(metric: &str, meta: Option<&MetricMeta>) -> String {
    match meta {
        Some(m) => m.label(),
        None => metric.to_string(),
    }
}

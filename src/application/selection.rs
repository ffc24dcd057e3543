// Metric selection and tray membership

/// Which metrics are plotted and which cards sit in the tray.
///
/// The two lists are deliberately independent: deselecting a metric keeps
/// its card in the tray (dimmed) so its stats stay visible, and only an
/// explicit removal drops the card. Tray order is user-controlled and
/// survives selection churn.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Vec<String>,
    tray: Vec<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics currently plotted, in selection order.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Tray cards, in user order.
    pub fn tray(&self) -> &[String] {
        &self.tray
    }

    pub fn is_selected(&self, metric: &str) -> bool {
        self.selected.iter().any(|m| m == metric)
    }

    /// A card dims when its metric is in the tray but not plotted.
    pub fn is_dimmed(&self, metric: &str) -> bool {
        !self.is_selected(metric) && self.tray.iter().any(|m| m == metric)
    }

    /// Flips a metric in or out of the selection. Selecting also enrolls
    /// the metric in the tray if it is not already there; deselecting
    /// never touches the tray.
    pub fn toggle(&mut self, metric: &str) {
        if let Some(pos) = self.selected.iter().position(|m| m == metric) {
            self.selected.remove(pos);
        } else {
            self.selected.push(metric.to_string());
            if !self.tray.iter().any(|m| m == metric) {
                self.tray.push(metric.to_string());
            }
        }
    }

    /// Replaces the selection wholesale, enrolling any newcomers in the
    /// tray. Used when a view is (re)created with an explicit metric list.
    pub fn set_selection(&mut self, metrics: &[String]) {
        self.selected = metrics.to_vec();
        for metric in metrics {
            if !self.tray.iter().any(|m| m == metric) {
                self.tray.push(metric.clone());
            }
        }
    }

    /// Removes a metric from both the tray and the selection.
    pub fn remove(&mut self, metric: &str) {
        self.selected.retain(|m| m != metric);
        self.tray.retain(|m| m != metric);
    }

    /// Moves the tray card at `from` so it lands at index `to`. Out of
    /// range indices are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.tray.len() || to >= self.tray.len() {
            return;
        }
        let card = self.tray.remove(from);
        self.tray.insert(to, card);
    }

    /// Drops metrics that no longer exist in the catalog from both lists.
    pub fn retain_known(&mut self, known: &[String]) {
        self.selected.retain(|m| known.contains(m));
        self.tray.retain(|m| known.contains(m));
    }

    /// Clears everything. Used on session switch.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.tray.clear();
    }
}

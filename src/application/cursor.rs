// Cursor tracking state with frame-gated hover coalescing

/// Whether the cursor is currently pinned to a time on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Idle,
    Tracking,
}

/// Current cursor position. Assigned positions are clamped to the observed
/// time range before being stored, so readouts never index outside it.
#[derive(Debug, Clone, Copy)]
pub struct CursorState {
    mode: CursorMode,
    time_ms: i64,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            mode: CursorMode::Idle,
            time_ms: 0,
        }
    }

    pub fn mode(&self) -> CursorMode {
        self.mode
    }

    pub fn time_ms(&self) -> i64 {
        self.time_ms
    }

    /// Pins the cursor at `t_ms`, clamped to `[0, max_ms]`.
    pub fn apply_hover(&mut self, t_ms: i64, max_ms: i64) {
        self.mode = CursorMode::Tracking;
        self.time_ms = t_ms.clamp(0, max_ms.max(0));
    }

    /// Direct assignment from a slider drag. Snaps the cursor and
    /// overrides any tracking in progress.
    pub fn set_direct(&mut self, t_ms: i64, max_ms: i64) {
        self.mode = CursorMode::Idle;
        self.time_ms = t_ms.clamp(0, max_ms.max(0));
    }

    /// Back to idle at time zero. Used on session switch.
    pub fn reset(&mut self) {
        self.mode = CursorMode::Idle;
        self.time_ms = 0;
    }
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Coalesces hover submissions between frame ticks.
///
/// Any number of submissions may land between two ticks; only the latest
/// survives. `take` drains the slot, so a tick with no new submissions
/// applies nothing.
#[derive(Debug, Default)]
pub struct FrameGate {
    pending: Option<i64>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hover position, replacing any not-yet-applied one.
    pub fn submit(&mut self, t_ms: i64) {
        self.pending = Some(t_ms);
    }

    /// Takes the latest pending position, leaving the gate empty.
    pub fn take(&mut self) -> Option<i64> {
        self.pending.take()
    }

    /// Drops any pending position without applying it.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_starts_idle_at_zero() {
        let cursor = CursorState::new();
        assert_eq!(cursor.mode(), CursorMode::Idle);
        assert_eq!(cursor.time_ms(), 0);
    }

    #[test]
    fn test_hover_enters_tracking() {
        let mut cursor = CursorState::new();
        cursor.apply_hover(250, 1000);
        assert_eq!(cursor.mode(), CursorMode::Tracking);
        assert_eq!(cursor.time_ms(), 250);
    }

    #[test]
    fn test_hover_clamps_to_observed_range() {
        let mut cursor = CursorState::new();
        cursor.apply_hover(-50, 1000);
        assert_eq!(cursor.time_ms(), 0);
        cursor.apply_hover(5000, 1000);
        assert_eq!(cursor.time_ms(), 1000);
    }

    #[test]
    fn test_hover_with_no_observed_data_pins_to_zero() {
        let mut cursor = CursorState::new();
        cursor.apply_hover(300, 0);
        assert_eq!(cursor.time_ms(), 0);
    }

    #[test]
    fn test_direct_assignment_overrides_tracking() {
        let mut cursor = CursorState::new();
        cursor.apply_hover(100, 1000);
        cursor.set_direct(4000, 1000);
        assert_eq!(cursor.mode(), CursorMode::Idle);
        assert_eq!(cursor.time_ms(), 1000);
    }

    #[test]
    fn test_reset_returns_to_idle_at_zero() {
        let mut cursor = CursorState::new();
        cursor.apply_hover(100, 1000);
        cursor.reset();
        assert_eq!(cursor.mode(), CursorMode::Idle);
        assert_eq!(cursor.time_ms(), 0);
    }

    #[test]
    fn test_gate_keeps_only_the_latest_submission() {
        let mut gate = FrameGate::new();
        gate.submit(10);
        gate.submit(20);
        gate.submit(30);
        assert_eq!(gate.take(), Some(30));
    }

    #[test]
    fn test_gate_is_empty_after_take() {
        let mut gate = FrameGate::new();
        gate.submit(10);
        assert_eq!(gate.take(), Some(10));
        assert_eq!(gate.take(), None);
    }

    #[test]
    fn test_gate_clear_discards_pending() {
        let mut gate = FrameGate::new();
        gate.submit(10);
        gate.clear();
        assert_eq!(gate.take(), None);
    }
}

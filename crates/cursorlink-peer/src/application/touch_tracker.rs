//! TouchTracker: turns absolute touch points into relative movement.
//!
//! A touchscreen reports where the finger *is*; the relay carries how far the
//! cursor should *move*.  Each drag point is compared with the previous one
//! and the difference is scaled by a sensitivity factor, so a small phone
//! screen can sweep a much larger display.

/// Default multiplier applied to finger movement.
pub const DEFAULT_SENSITIVITY: f64 = 2.5;

#[derive(Debug, Clone)]
pub struct TouchTracker {
    sensitivity: f64,
    last: Option<(f64, f64)>,
}

impl TouchTracker {
    pub fn new(sensitivity: f64) -> Self {
        Self {
            sensitivity,
            last: None,
        }
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// A finger touched down at `(x, y)`.  Produces no movement.
    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.last = Some((x, y));
    }

    /// The finger moved to `(x, y)`.
    ///
    /// Returns the scaled delta since the previous point, or `None` when no
    /// touch is in progress (the point then starts a new touch).
    pub fn touch_move(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
        let previous = self.last.replace((x, y))?;
        let dx = (x - previous.0) * self.sensitivity;
        let dy = (y - previous.1) * self.sensitivity;
        Some((dx, dy))
    }

    /// The finger lifted.  The next move starts a fresh touch.
    pub fn touch_end(&mut self) {
        self.last = None;
    }

    pub fn is_touching(&self) -> bool {
        self.last.is_some()
    }
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

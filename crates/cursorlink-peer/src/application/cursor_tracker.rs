//! CursorTracker: the display side's virtual cursor.
//!
//! Movement arrives as relative deltas.  The tracker accumulates them and
//! clamps the result to the drawing surface, so a long swipe pins the cursor
//! to an edge instead of losing it off-screen.

/// Default drawing surface width in pixels.
pub const DEFAULT_SURFACE_WIDTH: f64 = 800.0;

/// Default drawing surface height in pixels.
pub const DEFAULT_SURFACE_HEIGHT: f64 = 600.0;

/// A point on the drawing surface.  `(0, 0)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

/// Accumulates relative movement into an absolute, clamped cursor position.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    width: f64,
    height: f64,
    position: CursorPosition,
    clicks: u64,
}

impl CursorTracker {
    /// Creates a tracker for a `width` × `height` surface with the cursor
    /// centred.
    ///
    /// Negative or non-finite dimensions are treated as zero.
    pub fn new(width: f64, height: f64) -> Self {
        let width = sanitize_extent(width);
        let height = sanitize_extent(height);
        Self {
            width,
            height,
            position: CursorPosition {
                x: width / 2.0,
                y: height / 2.0,
            },
            clicks: 0,
        }
    }

    /// Applies a movement delta and returns the new position.
    ///
    /// Non-finite deltas are ignored.
    pub fn apply_move(&mut self, dx: f64, dy: f64) -> CursorPosition {
        if dx.is_finite() && dy.is_finite() {
            self.position.x = (self.position.x + dx).clamp(0.0, self.width);
            self.position.y = (self.position.y + dy).clamp(0.0, self.height);
        }
        self.position
    }

    /// Records a click and returns where it landed.
    pub fn click(&mut self) -> CursorPosition {
        self.clicks += 1;
        self.position
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    /// Number of clicks recorded since the tracker was created or reset.
    pub fn click_count(&self) -> u64 {
        self.clicks
    }

    /// Re-centres the cursor and clears the click count.
    pub fn reset(&mut self) {
        *self = Self::new(self.width, self.height);
    }
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)
    }
}

fn sanitize_extent(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

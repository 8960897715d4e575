//! Shared numeric constants for the editor.

// ── Canvas ──────────────────────────────────────────────────────

/// Lower bound of the percentage canvas space.
pub const CANVAS_MIN: f64 = 0.0;

/// Upper bound of the percentage canvas space.
pub const CANVAS_MAX: f64 = 100.0;

/// Canvas center on both axes, in percent.
pub const CANVAS_CENTER: f64 = 50.0;

// ── Layers ──────────────────────────────────────────────────────

/// Offset applied to both axes of a duplicated layer.
pub const DUPLICATE_OFFSET: f64 = 5.0;

/// Fine nudge step in percentage points.
pub const NUDGE_STEP: f64 = 1.0;

/// Coarse nudge step (shift held) in percentage points.
pub const NUDGE_STEP_COARSE: f64 = 10.0;

/// Rotation step for the bracket-key shortcuts, in degrees.
pub const ROTATE_STEP_DEG: f64 = 15.0;

// ── Snapping ────────────────────────────────────────────────────

/// Maximum distance from a grid line for the grid snap to engage.
pub const GRID_SNAP_TOLERANCE: f64 = 2.0;

/// Maximum distance from another layer or the canvas center for a smart guide.
pub const SMART_GUIDE_TOLERANCE: f64 = 1.5;

// ── Animation ───────────────────────────────────────────────────

/// Keyframes closer than this (seconds) occupy the same timeline slot.
pub const KEYFRAME_TIME_EPSILON: f64 = 0.01;

//! Geometry engine: pointer mapping, grid snapping, smart guides, alignment.
//!
//! All math runs in percentage canvas space. Functions here are pure: they
//! read the layer collection and return `LayerPatch`es for the editor to
//! apply and broadcast.
//!
//! Snap precedence: the grid snap runs first, then every smart-guide target
//! is tested against the grid-snapped candidate. A later match overrides an
//! earlier one, and the canvas center is tested last, so a smart guide always
//! wins over the grid and the center always wins over other layers.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::config::EditorSettings;
use crate::consts::{CANVAS_CENTER, CANVAS_MAX, GRID_SNAP_TOLERANCE, SMART_GUIDE_TOLERANCE};
use crate::layer::{Layer, LayerId, LayerPatch, LayerStore, clamp_percent, wrap_degrees};

// =============================================================================
// POINTER MAPPING
// =============================================================================

/// Screen-space rectangle of the canvas element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    /// Convert a client-space pointer position to canvas percentages.
    ///
    /// The result is not clamped; positions outside the canvas map outside
    /// [0, 100] and are clamped when applied to a layer.
    #[must_use]
    pub fn to_percent(&self, client_x: f64, client_y: f64) -> (f64, f64) {
        let w = if self.width > 0.0 { self.width } else { 1.0 };
        let h = if self.height > 0.0 { self.height } else { 1.0 };
        (((client_x - self.left) / w) * CANVAS_MAX, ((client_y - self.top) / h) * CANVAS_MAX)
    }
}

// =============================================================================
// GUIDES
// =============================================================================

/// Axis a guide constrains. `X` guides are vertical lines at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// An active alignment hint line for rendering feedback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub axis: Axis,
    pub position: f64,
}

/// Result of snapping one candidate position.
#[derive(Debug, Clone, PartialEq)]
pub struct Snap {
    pub x: f64,
    pub y: f64,
    pub guides: Vec<Guide>,
}

/// Round `value` to the nearest grid line if it lies within tolerance of it.
#[must_use]
pub fn snap_to_grid(value: f64, grid_size: u32) -> f64 {
    if grid_size == 0 {
        return value;
    }
    let step = CANVAS_MAX / f64::from(grid_size);
    let snapped = (value / step).round() * step;
    if (value - snapped).abs() < GRID_SNAP_TOLERANCE { snapped } else { value }
}

fn snap_axis(candidate: f64, targets: impl Iterator<Item = f64>) -> Option<f64> {
    let mut hit = None;
    for target in targets {
        if (candidate - target).abs() < SMART_GUIDE_TOLERANCE {
            hit = Some(target);
        }
    }
    hit
}

/// Snap a raw drag position for layer `dragged` against the grid, the other
/// visible layers, and the canvas center. The returned position is clamped.
#[must_use]
pub fn snap_position(raw_x: f64, raw_y: f64, dragged: &LayerId, layers: &[Layer], settings: &EditorSettings) -> Snap {
    let (mut x, mut y) = (raw_x, raw_y);

    if settings.snap_to_grid {
        x = snap_to_grid(x, settings.grid_size);
        y = snap_to_grid(y, settings.grid_size);
    }

    let mut guides = Vec::new();
    if settings.show_smart_guides {
        let others = || layers.iter().filter(|l| l.id != *dragged && l.visible);
        let xs = others().map(|l| l.x).chain(std::iter::once(CANVAS_CENTER));
        let ys = others().map(|l| l.y).chain(std::iter::once(CANVAS_CENTER));

        if let Some(gx) = snap_axis(x, xs) {
            x = gx;
            guides.push(Guide { axis: Axis::X, position: gx });
        }
        if let Some(gy) = snap_axis(y, ys) {
            y = gy;
            guides.push(Guide { axis: Axis::Y, position: gy });
        }
    }

    Snap { x: clamp_percent(x), y: clamp_percent(y), guides }
}

// =============================================================================
// DRAG
// =============================================================================

/// An in-progress pointer drag of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    pub id: LayerId,
    /// Guides active after the most recent pointer move.
    pub guides: Vec<Guide>,
}

impl Drag {
    /// Start dragging `id`. Locked or unknown layers cannot be dragged.
    #[must_use]
    pub fn begin(layers: &LayerStore, id: &LayerId) -> Option<Self> {
        let layer = layers.get(id)?;
        if layer.locked {
            return None;
        }
        Some(Self { id: *id, guides: Vec::new() })
    }

    /// Feed one pointer position (canvas percent) and get the position patch.
    pub fn update(&mut self, raw_x: f64, raw_y: f64, layers: &LayerStore, settings: &EditorSettings) -> LayerPatch {
        let snap = snap_position(raw_x, raw_y, &self.id, layers.layers(), settings);
        self.guides = snap.guides;
        LayerPatch::position(snap.x, snap.y)
    }
}

// =============================================================================
// KEYBOARD TRANSFORMS
// =============================================================================

/// Patch moving a layer by `(dx, dy)`. `None` for locked layers.
#[must_use]
pub fn nudge(layer: &Layer, dx: f64, dy: f64) -> Option<LayerPatch> {
    if layer.locked {
        return None;
    }
    Some(LayerPatch::position(clamp_percent(layer.x + dx), clamp_percent(layer.y + dy)))
}

/// Patch rotating a layer by `delta` degrees, wrapped into [0, 360).
#[must_use]
pub fn rotate_by(layer: &Layer, delta: f64) -> LayerPatch {
    LayerPatch { rotation: Some(wrap_degrees(layer.rotation + delta)), ..Default::default() }
}

// =============================================================================
// ALIGNMENT
// =============================================================================

/// Alignment command applied to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl Alignment {
    #[must_use]
    pub fn axis(self) -> Axis {
        match self {
            Self::Left | Self::Center | Self::Right => Axis::X,
            Self::Top | Self::Middle | Self::Bottom => Axis::Y,
        }
    }
}

/// Compute the patches aligning every selected layer.
///
/// Left/top take the minimum coordinate of the selection, right/bottom the
/// maximum, center/middle the fixed canvas midpoint. Unknown ids are skipped;
/// an empty selection yields no patches.
#[must_use]
pub fn align(layers: &LayerStore, selection: &[LayerId], alignment: Alignment) -> Vec<(LayerId, LayerPatch)> {
    let selected: Vec<&Layer> = selection.iter().filter_map(|id| layers.get(id)).collect();
    if selected.is_empty() {
        return Vec::new();
    }

    let coord = |l: &Layer| match alignment.axis() {
        Axis::X => l.x,
        Axis::Y => l.y,
    };
    let target = match alignment {
        Alignment::Left | Alignment::Top => selected.iter().copied().map(coord).fold(f64::INFINITY, f64::min),
        Alignment::Right | Alignment::Bottom => selected.iter().copied().map(coord).fold(f64::NEG_INFINITY, f64::max),
        Alignment::Center | Alignment::Middle => CANVAS_CENTER,
    };

    selected
        .into_iter()
        .map(|l| {
            let patch = match alignment.axis() {
                Axis::X => LayerPatch { x: Some(target), ..Default::default() },
                Axis::Y => LayerPatch { y: Some(target), ..Default::default() },
            };
            (l.id, patch)
        })
        .collect()
}

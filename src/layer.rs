//! Layer model: logo layers, sparse layer patches, and the ordered layer store.
//!
//! This module defines what is on the logo canvas (`Layer`, `LayerKind`), a
//! sparse-update type for incremental edits (`LayerPatch`), and the runtime
//! store that owns the live layer collection (`LayerStore`).
//!
//! Positions are percentages of the canvas on both axes. Every mutation that
//! goes through the store re-establishes the field invariants: x/y clamped to
//! [0, 100], rotation wrapped into [0, 360), opacity clamped to [0, 100],
//! scale kept positive. Store order is z-order; index 0 is drawn first.

#[cfg(test)]
#[path = "layer_test.rs"]
mod layer_test;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::consts::{CANVAS_MAX, CANVAS_MIN, DUPLICATE_OFFSET};
use crate::notice::ErrorCode;

/// Unique identifier for a layer.
pub type LayerId = Uuid;

/// Smallest scale a layer may take.
const MIN_SCALE: f64 = 0.01;

// =============================================================================
// TYPES
// =============================================================================

/// The kind of visual element a layer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// The graphical mark.
    Icon,
    /// The brand name wordmark.
    Text,
    /// The tagline under the wordmark.
    Slogan,
}

impl LayerKind {
    /// Whether typography attributes apply to this kind.
    #[must_use]
    pub fn is_typographic(self) -> bool {
        matches!(self, Self::Text | Self::Slogan)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Icon => "icon",
            Self::Text => "text",
            Self::Slogan => "slogan",
        }
    }
}

/// Font weight for typographic layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Light,
    Regular,
    Medium,
    Bold,
}

/// One visual element of a logo composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Immutable identity, unique within the composition.
    pub id: LayerId,
    pub kind: LayerKind,
    /// Horizontal position, percent of canvas width.
    pub x: f64,
    /// Vertical position, percent of canvas height.
    pub y: f64,
    pub scale: f64,
    /// Clockwise rotation in degrees, in [0, 360).
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Opacity in percent.
    pub opacity: f64,
    pub visible: bool,
    pub locked: bool,
    /// Collaborator who most recently edited this layer remotely (soft lock).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
}

impl Layer {
    /// Create a visible, unlocked layer at `(x, y)` with identity transform.
    #[must_use]
    pub fn new(kind: LayerKind, x: f64, y: f64) -> Self {
        let mut layer = Self {
            id: Uuid::new_v4(),
            kind,
            x,
            y,
            scale: 1.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 100.0,
            visible: true,
            locked: false,
            locked_by: None,
            color: None,
            font_family: None,
            font_size: None,
            font_weight: None,
            letter_spacing: None,
        };
        layer.normalize();
        layer
    }

    /// Apply every present field of `patch`, then restore field invariants.
    /// Non-finite numbers in the patch are ignored.
    pub fn apply(&mut self, patch: &LayerPatch) {
        if let Some(x) = finite(patch.x) {
            self.x = clamp_percent(x);
        }
        if let Some(y) = finite(patch.y) {
            self.y = clamp_percent(y);
        }
        if let Some(scale) = finite(patch.scale) {
            self.scale = scale.max(MIN_SCALE);
        }
        if let Some(rotation) = finite(patch.rotation) {
            self.rotation = wrap_degrees(rotation);
        }
        if let Some(flip_x) = patch.flip_x {
            self.flip_x = flip_x;
        }
        if let Some(flip_y) = patch.flip_y {
            self.flip_y = flip_y;
        }
        if let Some(opacity) = finite(patch.opacity) {
            self.opacity = opacity.clamp(0.0, 100.0);
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(locked) = patch.locked {
            self.locked = locked;
        }
        if let Some(ref color) = patch.color {
            self.color = Some(color.clone());
        }
        if let Some(ref family) = patch.font_family {
            self.font_family = Some(family.clone());
        }
        if let Some(size) = finite(patch.font_size) {
            self.font_size = Some(size.max(1.0));
        }
        if let Some(weight) = patch.font_weight {
            self.font_weight = Some(weight);
        }
        if let Some(spacing) = finite(patch.letter_spacing) {
            self.letter_spacing = Some(spacing);
        }
    }

    /// Re-establish field invariants on a layer built outside the store,
    /// such as one loaded from disk. Non-finite numbers fall back to the
    /// defaults of [`Layer::new`].
    pub fn normalize(&mut self) {
        let center = f64::midpoint(CANVAS_MIN, CANVAS_MAX);
        self.x = clamp_percent(finite(Some(self.x)).unwrap_or(center));
        self.y = clamp_percent(finite(Some(self.y)).unwrap_or(center));
        self.scale = finite(Some(self.scale)).map_or(1.0, |s| s.max(MIN_SCALE));
        self.rotation = wrap_degrees(finite(Some(self.rotation)).unwrap_or(0.0));
        self.opacity = finite(Some(self.opacity)).map_or(100.0, |o| o.clamp(0.0, 100.0));
        self.font_size = finite(self.font_size).map(|s| s.max(1.0));
        self.letter_spacing = finite(self.letter_spacing);
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Sparse update for a layer. Only present fields are applied.
///
/// This is also the payload of a `layer-update` collaboration event, so it
/// never carries identity or the soft-lock marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip_x: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip_y: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
}

impl LayerPatch {
    /// Patch that moves a layer to `(x, y)`.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// Copy of the patch without its non-finite numeric fields.
    #[must_use]
    pub fn finite_only(&self) -> Self {
        Self {
            x: finite(self.x),
            y: finite(self.y),
            scale: finite(self.scale),
            rotation: finite(self.rotation),
            opacity: finite(self.opacity),
            font_size: finite(self.font_size),
            letter_spacing: finite(self.letter_spacing),
            ..self.clone()
        }
    }

    /// Returns `true` if the patch carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Clamp a coordinate into the percentage canvas.
#[must_use]
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(CANVAS_MIN, CANVAS_MAX)
}

/// Wrap an angle in degrees into [0, 360).
#[must_use]
pub fn wrap_degrees(value: f64) -> f64 {
    let wrapped = value.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error("layer id already present: {0}")]
    DuplicateId(LayerId),
}

impl ErrorCode for LayerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "E_DUPLICATE_LAYER",
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Ordered in-memory collection of layers. Order is z-order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStore {
    layers: Vec<Layer>,
}

impl LayerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Build a store from imported layers. Later duplicates of an id are dropped.
    #[must_use]
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        let mut store = Self::new();
        for layer in layers {
            if let Err(e) = store.insert(layer) {
                warn!(error = %e, "dropping imported layer");
            }
        }
        store
    }

    /// Create a new layer on top of the stack and return its id.
    pub fn create(&mut self, kind: LayerKind, x: f64, y: f64) -> LayerId {
        let layer = Layer::new(kind, x, y);
        let id = layer.id;
        self.layers.push(layer);
        id
    }

    /// Append a fully-formed layer on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if a layer with the same id already exists.
    pub fn insert(&mut self, mut layer: Layer) -> Result<(), LayerError> {
        if self.contains(&layer.id) {
            return Err(LayerError::DuplicateId(layer.id));
        }
        layer.normalize();
        self.layers.push(layer);
        Ok(())
    }

    /// Apply a partial update. Returns false if the layer doesn't exist.
    pub fn update(&mut self, id: &LayerId, patch: &LayerPatch) -> bool {
        let Some(layer) = self.get_mut(id) else {
            debug!(%id, "update for unknown layer ignored");
            return false;
        };
        layer.apply(patch);
        true
    }

    /// Remove a layer by id, returning it if it was present.
    pub fn remove(&mut self, id: &LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        Some(self.layers.remove(index))
    }

    /// Copy a layer under a fresh id, offset by [`DUPLICATE_OFFSET`] on both
    /// axes, and place it directly above the source.
    pub fn duplicate(&mut self, id: &LayerId) -> Option<LayerId> {
        let index = self.index_of(id)?;
        let mut copy = self.layers[index].clone();
        let mut new_id = Uuid::new_v4();
        while self.contains(&new_id) {
            new_id = Uuid::new_v4();
        }
        copy.id = new_id;
        copy.x = clamp_percent(copy.x + DUPLICATE_OFFSET);
        copy.y = clamp_percent(copy.y + DUPLICATE_OFFSET);
        copy.locked_by = None;
        self.layers.insert(index + 1, copy);
        Some(new_id)
    }

    /// Move a layer to `new_index` in z-order. Out-of-range indices clamp to the top.
    pub fn reorder(&mut self, id: &LayerId, new_index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let layer = self.layers.remove(from);
        let to = new_index.min(self.layers.len());
        self.layers.insert(to, layer);
        true
    }

    /// Return a reference to a layer by id.
    #[must_use]
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == *id)
    }

    pub(crate) fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == *id)
    }

    #[must_use]
    pub fn contains(&self, id: &LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Z-order index of a layer.
    #[must_use]
    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == *id)
    }

    /// All layers in z-order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Replace the whole collection, e.g. when restoring a history snapshot.
    pub fn restore(&mut self, layers: Vec<Layer>) {
        self.layers = layers;
    }

    /// Number of layers in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if the store contains no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

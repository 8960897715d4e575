//! Animation engine: keyframe tracks, interpolation, and the playback clock.
//!
//! DESIGN
//! ======
//! A `Timeline` owns one `LayerAnimation` per animated layer, and each of
//! those owns one `Track` per animated `Property`. Tracks keep their
//! keyframes sorted by time; a write within [`KEYFRAME_TIME_EPSILON`] of an
//! existing keyframe replaces it, so no two keyframes share a time.
//!
//! Interpolation is linear between the bounding pair and clamps outside the
//! keyframe range. Easing tags are stored for every keyframe; the eased
//! variant is opt-in.
//!
//! Playback never writes into the layer store. Frames are rendered through
//! `animated_layer`, a projection of the authoritative layer at time `t`.

pub mod ease;
pub mod playback;


use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

pub use ease::Easing;
pub use playback::{Playback, PlaybackState, StopMode, Tick};

use crate::config::DEFAULT_ANIMATION_DURATION_SECS;
use crate::consts::KEYFRAME_TIME_EPSILON;
use crate::layer::{Layer, LayerId, LayerPatch};

/// Unique identifier for a keyframe.
pub type KeyframeId = Uuid;

// =============================================================================
// TYPES
// =============================================================================

/// The closed set of animatable layer properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    X,
    Y,
    Scale,
    Rotation,
    Opacity,
}

impl Property {
    pub const ALL: [Self; 5] = [Self::X, Self::Y, Self::Scale, Self::Rotation, Self::Opacity];

    /// Current value of this property on `layer`.
    #[must_use]
    pub fn read(self, layer: &Layer) -> f64 {
        match self {
            Self::X => layer.x,
            Self::Y => layer.y,
            Self::Scale => layer.scale,
            Self::Rotation => layer.rotation,
            Self::Opacity => layer.opacity,
        }
    }

    /// Patch setting this property to `value`.
    #[must_use]
    pub fn patch(self, value: f64) -> LayerPatch {
        let mut patch = LayerPatch::default();
        match self {
            Self::X => patch.x = Some(value),
            Self::Y => patch.y = Some(value),
            Self::Scale => patch.scale = Some(value),
            Self::Rotation => patch.rotation = Some(value),
            Self::Opacity => patch.opacity = Some(value),
        }
        patch
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub id: KeyframeId,
    /// Seconds from the start of the timeline.
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub easing: Easing,
}

/// Keyframes for one (layer, property) pair, sorted by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub property: Property,
    keyframes: Vec<Keyframe>,
}

impl Track {
    #[must_use]
    pub fn new(property: Property) -> Self {
        Self { property, keyframes: Vec::new() }
    }

    /// Insert a keyframe, replacing any keyframe at (nearly) the same time.
    pub fn upsert(&mut self, keyframe: Keyframe) {
        self.keyframes.retain(|k| (k.time - keyframe.time).abs() > KEYFRAME_TIME_EPSILON);
        let at = self.keyframes.partition_point(|k| k.time < keyframe.time);
        self.keyframes.insert(at, keyframe);
    }

    pub fn remove(&mut self, id: &KeyframeId) -> bool {
        let before = self.keyframes.len();
        self.keyframes.retain(|k| k.id != *id);
        self.keyframes.len() != before
    }

    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Interpolated value at `t`, or `None` for an empty track.
    #[must_use]
    pub fn value_at(&self, t: f64) -> Option<f64> {
        (!self.keyframes.is_empty()).then(|| interpolate(&self.keyframes, t))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerAnimation {
    pub layer_id: LayerId,
    pub tracks: Vec<Track>,
}

impl LayerAnimation {
    #[must_use]
    pub fn track(&self, property: Property) -> Option<&Track> {
        self.tracks.iter().find(|t| t.property == property)
    }

    fn track_mut(&mut self, property: Property) -> &mut Track {
        if let Some(i) = self.tracks.iter().position(|t| t.property == property) {
            return &mut self.tracks[i];
        }
        self.tracks.push(Track::new(property));
        let last = self.tracks.len() - 1;
        &mut self.tracks[last]
    }
}

// =============================================================================
// INTERPOLATION
// =============================================================================

fn sorted(keyframes: &[Keyframe]) -> Cow<'_, [Keyframe]> {
    if keyframes.is_sorted_by(|a, b| a.time <= b.time) {
        Cow::Borrowed(keyframes)
    } else {
        let mut owned = keyframes.to_vec();
        owned.sort_by(|a, b| a.time.total_cmp(&b.time));
        Cow::Owned(owned)
    }
}

/// Locate the segment containing `t`. Returns `Err(value)` when `t` is
/// clamped to an end (or there is a single keyframe).
fn segment(keyframes: &[Keyframe], t: f64) -> Result<(&Keyframe, &Keyframe, f64), f64> {
    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return Err(0.0);
    };
    if keyframes.len() == 1 || t.is_nan() || t <= first.time {
        return Err(first.value);
    }
    if t >= last.time {
        return Err(last.value);
    }
    let next_idx = keyframes.partition_point(|k| k.time <= t);
    let (Some(prev), Some(next)) = (next_idx.checked_sub(1).and_then(|i| keyframes.get(i)), keyframes.get(next_idx)) else {
        return Err(first.value);
    };
    let frac = (t - prev.time) / (next.time - prev.time);
    Ok((prev, next, frac))
}

/// Linear interpolation over `keyframes` at time `t`.
///
/// Empty input yields 0. One keyframe yields its value for every `t`.
/// Outside the keyframe range the nearest end value is returned.
#[must_use]
pub fn interpolate(keyframes: &[Keyframe], t: f64) -> f64 {
    let keyframes = sorted(keyframes);
    match segment(&keyframes, t) {
        Ok((prev, next, frac)) => prev.value + (next.value - prev.value) * frac,
        Err(value) => value,
    }
}

/// Like [`interpolate`], but shapes each segment with the easing tag of the
/// keyframe that starts it.
#[must_use]
pub fn interpolate_eased(keyframes: &[Keyframe], t: f64) -> f64 {
    let keyframes = sorted(keyframes);
    match segment(&keyframes, t) {
        Ok((prev, next, frac)) => prev.value + (next.value - prev.value) * prev.easing.apply(frac),
        Err(value) => value,
    }
}

// =============================================================================
// TIMELINE
// =============================================================================

/// Every animation track of a composition plus the timeline length.
///
/// Deserialization goes through [`Timeline::from_animations`], so a
/// persisted timeline gets the same guarantees as one built in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PersistedTimeline")]
pub struct Timeline {
    /// Timeline length in seconds. Always positive.
    duration: f64,
    animations: Vec<LayerAnimation>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_DURATION_SECS)
    }
}

impl Timeline {
    #[must_use]
    pub fn new(duration: f64) -> Self {
        let duration = if duration > 0.0 && duration.is_finite() { duration } else { 1.0 };
        Self { duration, animations: Vec::new() }
    }

    /// Rebuild from persisted animations.
    ///
    /// Keyframes go through the same write path as `add_keyframe`, so the
    /// result is sorted and deduplicated even if the input was not.
    /// Non-finite keyframes are dropped.
    #[must_use]
    pub fn from_animations(duration: f64, animations: Vec<LayerAnimation>) -> Self {
        let mut timeline = Self::new(duration);
        for anim in animations {
            for track in anim.tracks {
                for mut keyframe in track.keyframes {
                    if !keyframe.time.is_finite() || !keyframe.value.is_finite() {
                        warn!(layer_id = %anim.layer_id, "dropping non-finite keyframe");
                        continue;
                    }
                    keyframe.time = keyframe.time.clamp(0.0, timeline.duration);
                    timeline.animation_mut(anim.layer_id).track_mut(track.property).upsert(keyframe);
                }
            }
        }
        timeline
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Change the timeline length. Non-positive values are ignored.
    /// Keyframes past the new end stay stored but are never reached.
    pub fn set_duration(&mut self, duration: f64) -> bool {
        if duration <= 0.0 || !duration.is_finite() {
            return false;
        }
        self.duration = duration;
        true
    }

    #[must_use]
    pub fn animations(&self) -> &[LayerAnimation] {
        &self.animations
    }

    #[must_use]
    pub fn animation(&self, layer_id: &LayerId) -> Option<&LayerAnimation> {
        self.animations.iter().find(|a| a.layer_id == *layer_id)
    }

    #[must_use]
    pub fn track(&self, layer_id: &LayerId, property: Property) -> Option<&Track> {
        self.animation(layer_id)?.track(property)
    }

    /// Write a keyframe with the default easing. Time is clamped into
    /// `[0, duration]`. Returns the new keyframe's id, or `None` when the
    /// time or value is not finite.
    pub fn add_keyframe(&mut self, layer_id: LayerId, property: Property, time: f64, value: f64) -> Option<KeyframeId> {
        self.add_keyframe_with(layer_id, property, time, value, Easing::default())
    }

    pub fn add_keyframe_with(
        &mut self,
        layer_id: LayerId,
        property: Property,
        time: f64,
        value: f64,
        easing: Easing,
    ) -> Option<KeyframeId> {
        if !time.is_finite() || !value.is_finite() {
            return None;
        }
        let keyframe = Keyframe { id: Uuid::new_v4(), time: time.clamp(0.0, self.duration), value, easing };
        let id = keyframe.id;
        self.animation_mut(layer_id).track_mut(property).upsert(keyframe);
        Some(id)
    }

    /// Delete one keyframe. Empty tracks and animations are pruned.
    pub fn remove_keyframe(&mut self, layer_id: &LayerId, property: Property, id: &KeyframeId) -> bool {
        let Some(anim) = self.animations.iter_mut().find(|a| a.layer_id == *layer_id) else {
            return false;
        };
        let Some(track) = anim.tracks.iter_mut().find(|t| t.property == property) else {
            return false;
        };
        let removed = track.remove(id);
        anim.tracks.retain(|t| !t.is_empty());
        self.animations.retain(|a| !a.tracks.is_empty());
        removed
    }

    /// Drop every track of a deleted layer.
    pub fn remove_layer(&mut self, layer_id: &LayerId) -> bool {
        let before = self.animations.len();
        self.animations.retain(|a| a.layer_id != *layer_id);
        self.animations.len() != before
    }

    /// Interpolated value of one property, `None` when it is not animated.
    #[must_use]
    pub fn value_at(&self, layer_id: &LayerId, property: Property, t: f64) -> Option<f64> {
        self.track(layer_id, property)?.value_at(t)
    }

    /// Project `layer` at time `t`: every animated property takes its
    /// interpolated value; the rest keep the layer's own values.
    #[must_use]
    pub fn animated_layer(&self, layer: &Layer, t: f64) -> Layer {
        let mut projected = layer.clone();
        let Some(anim) = self.animation(&layer.id) else {
            return projected;
        };
        for track in &anim.tracks {
            if let Some(value) = track.value_at(t) {
                projected.apply(&track.property.patch(value));
            }
        }
        projected
    }

    fn animation_mut(&mut self, layer_id: LayerId) -> &mut LayerAnimation {
        if let Some(i) = self.animations.iter().position(|a| a.layer_id == layer_id) {
            return &mut self.animations[i];
        }
        self.animations.push(LayerAnimation { layer_id, tracks: Vec::new() });
        let last = self.animations.len() - 1;
        &mut self.animations[last]
    }
}

/// Wire shape of a timeline, validated into a [`Timeline`] on load.
#[derive(Deserialize)]
struct PersistedTimeline {
    #[serde(default = "default_duration")]
    duration: f64,
    #[serde(default)]
    animations: Vec<LayerAnimation>,
}

fn default_duration() -> f64 {
    DEFAULT_ANIMATION_DURATION_SECS
}

impl From<PersistedTimeline> for Timeline {
    fn from(persisted: PersistedTimeline) -> Self {
        let mut duration = persisted.duration;
        if !(duration > 0.0 && duration.is_finite()) {
            warn!(duration, "invalid timeline duration, using default");
            duration = DEFAULT_ANIMATION_DURATION_SECS;
        }
        Self::from_animations(duration, persisted.animations)
    }
}

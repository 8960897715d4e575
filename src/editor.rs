//! Editor orchestrator: the single owner of a composition being edited.
//!
//! DESIGN
//! ======
//! `Editor` ties the layer store, history, geometry, animation and
//! collaboration together. It is the only thing that mutates the layer
//! collection, and it does so synchronously: every time-dependent call takes
//! an explicit `now`, and the owner (normally `session::Session`) drives
//! deadlines by calling `poll` at `next_deadline`.
//!
//! Local layer edits are broadcast to collaborators, coalesced into history
//! snapshots after a quiet window, and schedule a debounced re-synthesis.
//! Inbound remote edits are applied last-write-wins and leave a soft-lock
//! marker; they are recorded in history but do not schedule a synthesis, so
//! one edit never makes every peer call the backend.
//!
//! Synthesis is a two-step protocol: `begin_synthesis` hands out a ticket
//! carrying the render inputs (and refuses while one is outstanding),
//! `finish_synthesis` applies the result. A failure leaves the previous
//! renders untouched and becomes an error notice.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::animation::{KeyframeId, Playback, Property, StopMode, Tick, Timeline};
use crate::collab::{CollabError, CollabEvent, CollabPeer, Presence, SoftLocks};
use crate::composition::Composition;
use crate::config::{EditorSettings, StudioConfig};
use crate::debounce::Debouncer;
use crate::geometry::{self, Alignment, CanvasRect, Drag, Guide};
use crate::history::History;
use crate::layer::{Layer, LayerId, LayerKind, LayerPatch, LayerStore};
use crate::notice::{ErrorCode, Notice};
use crate::synth::batch::{BrandKitAsset, LogoVariant};
use crate::synth::{BrandBrief, RenderPair, SynthesisError};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("a synthesis is already in progress")]
    SynthesisInFlight,
    #[error("layer not found: {0}")]
    UnknownLayer(LayerId),
    #[error("keyframe time and value must be finite")]
    NonFiniteKeyframe,
}

impl ErrorCode for EditorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SynthesisInFlight => "E_SYNTHESIS_BUSY",
            Self::UnknownLayer(_) => "E_LAYER_NOT_FOUND",
            Self::NonFiniteKeyframe => "E_INVALID_KEYFRAME",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::SynthesisInFlight)
    }
}

// =============================================================================
// SYNTHESIS TICKET
// =============================================================================

/// Which synthesizer operation a ticket is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisKind {
    Recompose,
    Variants,
    BrandKit,
}

impl SynthesisKind {
    /// User-facing operation name used in notices.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Recompose => "Workspace sync",
            Self::Variants => "Variant generation",
            Self::BrandKit => "Brand kit generation",
        }
    }
}

/// Result of a finished synthesis.
#[derive(Debug, Clone)]
pub enum SynthesisOutput {
    Recompose(RenderPair),
    Variants(Vec<LogoVariant>),
    BrandKit(Vec<BrandKitAsset>),
}

/// Inputs for one synthesis, captured when it starts.
#[derive(Debug, Clone)]
pub struct SynthesisTicket {
    pub id: u64,
    pub kind: SynthesisKind,
    pub brief: BrandBrief,
    pub source: String,
    pub layers: Vec<Layer>,
}

// =============================================================================
// EDITOR
// =============================================================================

pub struct Editor {
    /// Brand attributes and renders. Layers and animation live in `layers`
    /// and `timeline` and are folded back in by `commit`.
    meta: Composition,
    layers: LayerStore,
    history: History,
    history_debounce: Debouncer,
    settings: EditorSettings,
    selection: Vec<LayerId>,
    active: Option<LayerId>,
    drag: Option<Drag>,
    timeline: Timeline,
    playback: Playback,
    presence: Presence,
    soft_locks: SoftLocks,
    peer: Option<CollabPeer>,
    sync_debounce: Debouncer,
    /// The outstanding synthesis, if any.
    synthesis: Option<(u64, SynthesisKind)>,
    next_ticket: u64,
    /// A sync came due while a synthesis was outstanding.
    sync_deferred: bool,
    notices: Vec<Notice>,
}

impl Editor {
    #[must_use]
    pub fn new(mut composition: Composition, config: &StudioConfig) -> Self {
        let layers = LayerStore::from_layers(std::mem::take(&mut composition.layers));
        let mut timeline = std::mem::take(&mut composition.animation);
        if timeline.animations().is_empty() {
            timeline.set_duration(config.animation_duration_secs);
        }
        let history = History::new(layers.layers(), config.history_capacity);
        let playback = Playback::new(timeline.duration());
        Self {
            meta: composition,
            layers,
            history,
            history_debounce: Debouncer::new(config.history_debounce),
            settings: EditorSettings::default(),
            selection: Vec::new(),
            active: None,
            drag: None,
            timeline,
            playback,
            presence: Presence::new(Uuid::nil()),
            soft_locks: SoftLocks::new(config.soft_lock),
            peer: None,
            sync_debounce: Debouncer::new(config.sync_debounce),
            synthesis: None,
            next_ticket: 0,
            sync_deferred: false,
            notices: Vec::new(),
        }
    }

    /// Connect to a collaboration bus and announce this editor.
    pub fn attach_peer(&mut self, peer: CollabPeer) {
        self.presence = Presence::new(peer.id());
        peer.join();
        self.peer = Some(peer);
    }

    /// Announce departure and drop the bus connection.
    pub fn detach_peer(&mut self) {
        if let Some(peer) = self.peer.take() {
            peer.leave();
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        self.layers.layers()
    }

    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    #[must_use]
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut EditorSettings {
        &mut self.settings
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    #[must_use]
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    #[must_use]
    pub fn soft_lock_holder(&self, id: &LayerId) -> Option<Uuid> {
        self.soft_locks.holder(id)
    }

    #[must_use]
    pub fn composition(&self) -> &Composition {
        &self.meta
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Queue a notice produced outside the editor.
    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Hand pending notices to the host for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // --- Layer mutations ---

    fn after_local_edit(&mut self, id: LayerId, patch: &LayerPatch, now: Instant) {
        if let Some(peer) = &self.peer {
            peer.broadcast_layer_update(id, patch);
        }
        self.after_structural_edit(now);
    }

    fn after_structural_edit(&mut self, now: Instant) {
        self.history_debounce.touch(now);
        self.sync_debounce.touch(now);
    }

    /// Apply a partial update to a layer. Unknown ids are a benign no-op.
    /// Non-finite fields are dropped before the patch is applied or broadcast.
    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch, now: Instant) -> bool {
        let patch = patch.finite_only();
        if patch.is_empty() || !self.layers.update(id, &patch) {
            return false;
        }
        self.after_local_edit(*id, &patch, now);
        true
    }

    pub fn create_layer(&mut self, kind: LayerKind, x: f64, y: f64, now: Instant) -> LayerId {
        let id = self.layers.create(kind, x, y);
        self.after_structural_edit(now);
        id
    }

    /// Duplicate a layer and make the copy the active selection.
    pub fn duplicate_layer(&mut self, id: &LayerId, now: Instant) -> Option<LayerId> {
        let copy = self.layers.duplicate(id)?;
        self.selection = vec![copy];
        self.active = Some(copy);
        self.after_structural_edit(now);
        Some(copy)
    }

    pub fn remove_layer(&mut self, id: &LayerId, now: Instant) -> bool {
        if self.layers.remove(id).is_none() {
            return false;
        }
        self.selection.retain(|s| s != id);
        if self.active == Some(*id) {
            self.active = None;
        }
        if self.drag.as_ref().is_some_and(|d| d.id == *id) {
            self.drag = None;
        }
        self.timeline.remove_layer(id);
        self.soft_locks.forget(id);
        self.after_structural_edit(now);
        true
    }

    pub fn reorder_layer(&mut self, id: &LayerId, new_index: usize, now: Instant) -> bool {
        if self.layers.index_of(id) == Some(new_index.min(self.layers.len().saturating_sub(1))) {
            return false;
        }
        if !self.layers.reorder(id, new_index) {
            return false;
        }
        self.after_structural_edit(now);
        true
    }

    /// Set visibility. Setting the current value changes nothing.
    pub fn set_visible(&mut self, id: &LayerId, visible: bool, now: Instant) -> bool {
        match self.layers.get(id) {
            Some(layer) if layer.visible != visible => {
                self.update_layer(id, &LayerPatch { visible: Some(visible), ..Default::default() }, now)
            }
            _ => false,
        }
    }

    /// Set the user lock. Setting the current value changes nothing.
    pub fn set_locked(&mut self, id: &LayerId, locked: bool, now: Instant) -> bool {
        match self.layers.get(id) {
            Some(layer) if layer.locked != locked => {
                self.update_layer(id, &LayerPatch { locked: Some(locked), ..Default::default() }, now)
            }
            _ => false,
        }
    }

    pub fn toggle_visibility(&mut self, id: &LayerId, now: Instant) -> bool {
        let Some(visible) = self.layers.get(id).map(|l| l.visible) else {
            return false;
        };
        self.set_visible(id, !visible, now)
    }

    pub fn toggle_lock(&mut self, id: &LayerId, now: Instant) -> bool {
        let Some(locked) = self.layers.get(id).map(|l| l.locked) else {
            return false;
        };
        self.set_locked(id, !locked, now)
    }

    /// Move a layer by a keyboard step. Locked layers don't move.
    pub fn nudge(&mut self, id: &LayerId, dx: f64, dy: f64, now: Instant) -> bool {
        if !(dx.is_finite() && dy.is_finite()) {
            return false;
        }
        let Some(layer) = self.layers.get(id) else {
            return false;
        };
        let Some(patch) = geometry::nudge(layer, dx, dy) else {
            self.notices.push(Notice::info("Layer is locked"));
            return false;
        };
        self.update_layer(id, &patch, now)
    }

    pub fn rotate(&mut self, id: &LayerId, delta_degrees: f64, now: Instant) -> bool {
        let Some(layer) = self.layers.get(id) else {
            return false;
        };
        let patch = geometry::rotate_by(layer, delta_degrees);
        self.update_layer(id, &patch, now)
    }

    // --- Selection ---

    /// Select a layer. `additive` toggles it within the current selection.
    pub fn select(&mut self, id: LayerId, additive: bool) {
        if !self.layers.contains(&id) {
            return;
        }
        if additive {
            if let Some(pos) = self.selection.iter().position(|s| *s == id) {
                self.selection.remove(pos);
            } else {
                self.selection.push(id);
            }
        } else {
            self.selection = vec![id];
        }
        self.active = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.active = None;
    }

    #[must_use]
    pub fn selection(&self) -> &[LayerId] {
        &self.selection
    }

    #[must_use]
    pub fn active_layer(&self) -> Option<LayerId> {
        self.active
    }

    /// Align every selected layer. Returns how many layers moved.
    pub fn align_selected(&mut self, alignment: Alignment, now: Instant) -> usize {
        let patches = geometry::align(&self.layers, &self.selection, alignment);
        patches
            .into_iter()
            .filter(|(id, patch)| self.update_layer(id, patch, now))
            .count()
    }

    // --- Drag ---

    /// Start dragging a layer. Locked layers are refused with an info notice.
    pub fn begin_drag(&mut self, id: &LayerId) -> bool {
        match Drag::begin(&self.layers, id) {
            Some(drag) => {
                self.active = Some(*id);
                self.drag = Some(drag);
                true
            }
            None => {
                if self.layers.contains(id) {
                    self.notices.push(Notice::info("Layer is locked"));
                }
                false
            }
        }
    }

    /// Feed a pointer position in canvas percent. Returns the active guides.
    pub fn drag_to(&mut self, raw_x: f64, raw_y: f64, now: Instant) -> Option<&[Guide]> {
        let mut drag = self.drag.take()?;
        let patch = drag.update(raw_x, raw_y, &self.layers, &self.settings);
        let id = drag.id;
        self.drag = Some(drag);
        self.update_layer(&id, &patch, now);
        self.drag.as_ref().map(|d| d.guides.as_slice())
    }

    /// Feed a pointer position in client pixels.
    pub fn drag_to_client(&mut self, rect: &CanvasRect, client_x: f64, client_y: f64, now: Instant) -> Option<&[Guide]> {
        let (x, y) = rect.to_percent(client_x, client_y);
        self.drag_to(x, y, now)
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // --- Animation ---

    /// Write a keyframe for an existing layer.
    ///
    /// # Errors
    ///
    /// `UnknownLayer` if the layer does not exist, `NonFiniteKeyframe` if
    /// `time` or `value` is NaN or infinite.
    pub fn add_keyframe(
        &mut self,
        layer_id: &LayerId,
        property: Property,
        time: f64,
        value: f64,
    ) -> Result<KeyframeId, EditorError> {
        if !self.layers.contains(layer_id) {
            return Err(EditorError::UnknownLayer(*layer_id));
        }
        self.timeline
            .add_keyframe(*layer_id, property, time, value)
            .ok_or(EditorError::NonFiniteKeyframe)
    }

    /// Key the layer's current value at the playhead.
    ///
    /// # Errors
    ///
    /// `UnknownLayer` if the layer does not exist.
    pub fn key_current_value(&mut self, layer_id: &LayerId, property: Property) -> Result<KeyframeId, EditorError> {
        let value = self
            .layers
            .get(layer_id)
            .map(|l| property.read(l))
            .ok_or(EditorError::UnknownLayer(*layer_id))?;
        let time = self.playback.current_time();
        self.timeline
            .add_keyframe(*layer_id, property, time, value)
            .ok_or(EditorError::NonFiniteKeyframe)
    }

    pub fn remove_keyframe(&mut self, layer_id: &LayerId, property: Property, id: &KeyframeId) -> bool {
        self.timeline.remove_keyframe(layer_id, property, id)
    }

    pub fn set_duration(&mut self, secs: f64) -> bool {
        self.timeline.set_duration(secs) && self.playback.set_duration(secs)
    }

    pub fn play(&mut self, now: Instant) {
        self.playback.play(now);
    }

    pub fn stop(&mut self, mode: StopMode) {
        self.playback.stop(mode);
    }

    pub fn toggle_playback(&mut self, now: Instant) {
        self.playback.toggle(now);
    }

    pub fn scrub(&mut self, time: f64) {
        self.playback.scrub(time);
    }

    pub fn jump_to_start(&mut self) {
        self.playback.scrub(0.0);
    }

    pub fn jump_to_end(&mut self) {
        self.playback.scrub(self.playback.duration());
    }

    /// Advance the playback clock one frame.
    pub fn tick(&mut self, now: Instant) -> Tick {
        self.playback.tick(now)
    }

    /// Every layer projected at the playhead. Authoritative layers are untouched.
    #[must_use]
    pub fn frame(&self) -> Vec<Layer> {
        let t = self.playback.current_time();
        self.layers
            .layers()
            .iter()
            .map(|l| self.timeline.animated_layer(l, t))
            .collect()
    }

    // --- History ---

    fn flush_history(&mut self) {
        if self.history_debounce.flush() {
            self.history.record(self.layers.layers());
        }
    }

    fn restore(&mut self, layers: Vec<Layer>, now: Instant) {
        self.layers.restore(layers);
        // Soft-lock markers are presence state; put live ones back.
        for layer in self.layers.layers().iter().map(|l| l.id).collect::<Vec<_>>() {
            if let Some(holder) = self.soft_locks.holder(&layer)
                && let Some(l) = self.layers.get_mut(&layer)
            {
                l.locked_by = Some(holder);
            }
        }
        let layers = &self.layers;
        self.selection.retain(|id| layers.contains(id));
        if self.active.is_some_and(|id| !layers.contains(&id)) {
            self.active = None;
        }
        self.drag = None;
        self.sync_debounce.touch(now);
    }

    /// Step back one snapshot. At the oldest snapshot this is an info notice.
    pub fn undo(&mut self, now: Instant) -> bool {
        self.flush_history();
        let Some(layers) = self.history.undo().map(<[Layer]>::to_vec) else {
            debug!("undo at oldest snapshot");
            self.notices.push(Notice::info("Nothing to undo"));
            return false;
        };
        self.restore(layers, now);
        true
    }

    /// Step forward one snapshot. At the newest snapshot this is an info notice.
    pub fn redo(&mut self, now: Instant) -> bool {
        self.flush_history();
        let Some(layers) = self.history.redo().map(<[Layer]>::to_vec) else {
            debug!("redo at newest snapshot");
            self.notices.push(Notice::info("Nothing to redo"));
            return false;
        };
        self.restore(layers, now);
        true
    }

    // --- Collaboration ---

    /// Apply one inbound collaboration event.
    pub fn handle_collab_event(&mut self, event: CollabEvent, now: Instant) {
        if self.peer.as_ref().is_some_and(|p| p.id() == event.origin()) {
            return;
        }
        match event {
            CollabEvent::Join { user } => {
                if self.presence.join(user)
                    && let Some(peer) = &self.peer
                {
                    peer.join();
                }
            }
            CollabEvent::Leave { user_id } => {
                self.presence.leave(&user_id);
            }
            CollabEvent::CursorMove { user_id, x, y } => {
                self.presence.move_cursor(&user_id, x, y);
            }
            CollabEvent::LayerUpdate { layer_id, updates, user_id } => {
                if !self.layers.update(&layer_id, &updates) {
                    return;
                }
                self.soft_locks.mark(layer_id, user_id, now);
                if let Some(layer) = self.layers.get_mut(&layer_id) {
                    layer.locked_by = Some(user_id);
                }
                self.history_debounce.touch(now);
            }
            CollabEvent::ChatMessage { message } => self.presence.push_message(message),
        }
    }

    /// Share the local cursor position.
    pub fn move_cursor(&mut self, x: f64, y: f64) {
        if let Some(peer) = &mut self.peer {
            peer.update_cursor(x, y);
        }
    }

    /// Send a chat message and append it to the local transcript.
    ///
    /// # Errors
    ///
    /// Blank or oversized messages are rejected before sending.
    pub fn send_chat(&mut self, text: &str) -> Result<(), CollabError> {
        let Some(peer) = &self.peer else {
            return Ok(());
        };
        let message = peer.send_chat(text).inspect_err(|e| {
            self.notices.push(Notice::from_error("Chat", e));
        })?;
        self.presence.push_message(message);
        Ok(())
    }

    // --- Deadlines ---

    /// Earliest instant at which `poll` has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.history_debounce.deadline(), self.sync_debounce.deadline(), self.soft_locks.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Run every deadline that has passed. Returns `true` when a
    /// re-synthesis is due; the caller should then `begin_synthesis`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.history_debounce.fire_if_due(now) {
            self.history.record(self.layers.layers());
        }
        for id in self.soft_locks.expire(now) {
            if let Some(layer) = self.layers.get_mut(&id) {
                layer.locked_by = None;
            }
        }
        if !self.sync_debounce.fire_if_due(now) {
            return false;
        }
        if self.synthesis.is_some() {
            debug!("sync due while synthesis outstanding; deferring");
            self.sync_deferred = true;
            return false;
        }
        true
    }

    // --- Synthesis ---

    #[must_use]
    pub fn is_synthesizing(&self) -> bool {
        self.synthesis.is_some()
    }

    /// Capture render inputs and mark a synthesis as outstanding.
    ///
    /// # Errors
    ///
    /// `SynthesisInFlight` while another synthesis is outstanding.
    pub fn begin_synthesis(&mut self, kind: SynthesisKind) -> Result<SynthesisTicket, EditorError> {
        if self.synthesis.is_some() {
            return Err(EditorError::SynthesisInFlight);
        }
        self.next_ticket += 1;
        let id = self.next_ticket;
        self.synthesis = Some((id, kind));
        if kind == SynthesisKind::Recompose {
            self.sync_debounce.cancel();
        }
        info!(ticket = id, ?kind, "synthesis started");
        Ok(SynthesisTicket {
            id,
            kind,
            brief: self.meta.brief(),
            source: self.meta.render_source().to_owned(),
            layers: self.layers.layers().to_vec(),
        })
    }

    /// Apply the outcome of the synthesis identified by `ticket`.
    ///
    /// On failure the previous outputs stay in place and an error notice is
    /// queued. A stale ticket is ignored.
    pub fn finish_synthesis(&mut self, ticket: u64, result: Result<SynthesisOutput, SynthesisError>, now: Instant) {
        let Some((current, kind)) = self.synthesis else {
            warn!(ticket, "ignoring result with no synthesis outstanding");
            return;
        };
        if current != ticket {
            warn!(ticket, current, "ignoring result for stale synthesis ticket");
            return;
        }
        self.synthesis = None;
        match result {
            Ok(output) => {
                info!(ticket, ?kind, "synthesis finished");
                let message = match output {
                    SynthesisOutput::Recompose(pair) => {
                        self.meta.light_url = Some(pair.light_url);
                        self.meta.dark_url = Some(pair.dark_url);
                        "Workspace synced"
                    }
                    SynthesisOutput::Variants(variants) => {
                        self.meta.variants = variants;
                        "Variants ready"
                    }
                    SynthesisOutput::BrandKit(assets) => {
                        self.meta.brand_kit = assets;
                        "Brand kit ready"
                    }
                };
                self.notices.push(Notice::success(message));
            }
            Err(e) => {
                warn!(ticket, ?kind, error = %e, "synthesis failed");
                self.notices.push(Notice::from_error(kind.label(), &e));
            }
        }
        if std::mem::take(&mut self.sync_deferred) {
            self.sync_debounce.touch(now);
        }
    }

    // --- Commit ---

    /// The persisted composition: metadata, layers in z-order, animation and
    /// the latest renders.
    #[must_use]
    pub fn commit(&self) -> Composition {
        let mut composition = self.meta.clone();
        composition.layers = self
            .layers
            .layers()
            .iter()
            .cloned()
            .map(|mut l| {
                l.locked_by = None;
                l
            })
            .collect();
        composition.animation = self.timeline.clone();
        composition
    }
}

//! Session: async driver for one `Editor`.
//!
//! DESIGN
//! ======
//! The editor itself is synchronous. A session owns it inside a single task
//! and feeds it from a `select!` loop:
//! - Commands from `SessionHandle` → editor operations
//! - Collaboration events from the bus → `handle_collab_event`
//! - Editor deadlines (history, sync, soft locks) → `poll`
//! - Frame ticks, only while playback runs → `tick`
//! - Finished synthesis tasks → `finish_synthesis`
//!
//! Backend calls run in spawned tasks so the loop never blocks on the
//! network; results come back over an internal channel tagged with the
//! editor's ticket id.
//!
//! LIFECYCLE
//! =========
//! 1. `Session::new` → session plus handle
//! 2. `run` until `shutdown` or every handle is dropped
//! 3. Announce `leave`, return the committed composition

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::animation::{KeyframeId, Property, StopMode};
use crate::collab::{CollabEvent, CollabPeer};
use crate::composition::Composition;
use crate::config::StudioConfig;
use crate::editor::{Editor, SynthesisKind, SynthesisOutput};
use crate::geometry::Alignment;
use crate::layer::{Layer, LayerId, LayerKind, LayerPatch};
use crate::notice::{ErrorCode, Notice};
use crate::synth::{Progress, SynthesisError, Synthesizer};

const COMMAND_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// COMMANDS
// =============================================================================

/// One request from the host UI.
#[derive(Debug)]
pub enum Command {
    UpdateLayer { id: LayerId, patch: LayerPatch },
    CreateLayer { kind: LayerKind, x: f64, y: f64 },
    DuplicateLayer { id: LayerId },
    RemoveLayer { id: LayerId },
    ReorderLayer { id: LayerId, index: usize },
    ToggleVisibility { id: LayerId },
    ToggleLock { id: LayerId },
    Nudge { id: LayerId, dx: f64, dy: f64 },
    Rotate { id: LayerId, delta: f64 },
    Select { id: LayerId, additive: bool },
    ClearSelection,
    Align(Alignment),
    BeginDrag { id: LayerId },
    DragTo { x: f64, y: f64 },
    EndDrag,
    Undo,
    Redo,
    AddKeyframe { layer_id: LayerId, property: Property, time: f64, value: f64 },
    KeyCurrentValue { layer_id: LayerId, property: Property },
    RemoveKeyframe { layer_id: LayerId, property: Property, id: KeyframeId },
    Play,
    Stop(StopMode),
    TogglePlayback,
    Scrub(f64),
    SetDuration(f64),
    MoveCursor { x: f64, y: f64 },
    SendChat(String),
    /// Re-synthesize now instead of waiting for the debounce.
    SyncNow,
    GenerateVariants,
    GenerateBrandKit,
    View(oneshot::Sender<View>),
    TakeNotices(oneshot::Sender<Vec<Notice>>),
    Commit(oneshot::Sender<Composition>),
    Shutdown(oneshot::Sender<Composition>),
}

/// What the host renders: the animated frame plus status.
#[derive(Debug, Clone)]
pub struct View {
    /// Layers projected at the playhead.
    pub frame: Vec<Layer>,
    pub current_time: f64,
    pub playing: bool,
    pub synthesizing: bool,
    pub progress: Option<Progress>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("editing session has ended")]
    Closed,
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Closed => "E_SESSION_CLOSED",
        }
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable sender side of a session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Queue a command.
    ///
    /// # Errors
    ///
    /// `Closed` once the session loop has exited.
    pub async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// # Errors
    ///
    /// `Closed` once the session loop has exited.
    pub async fn view(&self) -> Result<View, SessionError> {
        self.request(Command::View).await
    }

    /// # Errors
    ///
    /// `Closed` once the session loop has exited.
    pub async fn take_notices(&self) -> Result<Vec<Notice>, SessionError> {
        self.request(Command::TakeNotices).await
    }

    /// Current persisted form of the composition; the session keeps running.
    ///
    /// # Errors
    ///
    /// `Closed` once the session loop has exited.
    pub async fn commit(&self) -> Result<Composition, SessionError> {
        self.request(Command::Commit).await
    }

    /// Stop the session and return the final composition.
    ///
    /// # Errors
    ///
    /// `Closed` if the session had already exited.
    pub async fn shutdown(&self) -> Result<Composition, SessionError> {
        self.request(Command::Shutdown).await
    }
}

// =============================================================================
// SESSION
// =============================================================================

struct Completion {
    ticket: u64,
    result: Result<SynthesisOutput, SynthesisError>,
}

pub struct Session {
    editor: Editor,
    synthesizer: Synthesizer,
    config: StudioConfig,
    commands: mpsc::Receiver<Command>,
    collab: Option<mpsc::Receiver<CollabEvent>>,
    done_tx: mpsc::Sender<Completion>,
    done_rx: mpsc::Receiver<Completion>,
    progress_tx: mpsc::Sender<Progress>,
    progress_rx: mpsc::Receiver<Progress>,
    progress: Option<Progress>,
}

impl Session {
    #[must_use]
    pub fn new(composition: Composition, config: StudioConfig, synthesizer: Synthesizer) -> (Self, SessionHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (done_tx, done_rx) = mpsc::channel(4);
        let (progress_tx, progress_rx) = mpsc::channel(16);
        let session = Self {
            editor: Editor::new(composition, &config),
            synthesizer,
            config,
            commands,
            collab: None,
            done_tx,
            done_rx,
            progress_tx,
            progress_rx,
            progress: None,
        };
        (session, SessionHandle { tx })
    }

    /// Join a collaboration bus with the given connection.
    #[must_use]
    pub fn with_collab(mut self, peer: CollabPeer, events: mpsc::Receiver<CollabEvent>) -> Self {
        self.editor.attach_peer(peer);
        self.collab = Some(events);
        self
    }

    /// Drive the editor until shutdown. Returns the committed composition.
    pub async fn run(mut self) -> Composition {
        info!(composition = %self.editor.composition().id, "session started");
        let mut frames = tokio::time::interval(self.config.frame_tick);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let deadline = self.editor.next_deadline();
            let playing = self.editor.playback().is_playing();

            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if let Command::Shutdown(reply) = command {
                        self.editor.detach_peer();
                        let composition = self.editor.commit();
                        let _ = reply.send(composition.clone());
                        info!("session shut down");
                        return composition;
                    }
                    self.apply(command, Instant::now());
                }
                Some(event) = recv_collab(&mut self.collab) => {
                    self.editor.handle_collab_event(event, Instant::now());
                }
                Some(done) = self.done_rx.recv() => {
                    self.progress = None;
                    self.editor.finish_synthesis(done.ticket, done.result, Instant::now());
                }
                Some(progress) = self.progress_rx.recv() => {
                    debug!(index = progress.index, total = progress.total, label = progress.label, "synthesis progress");
                    self.progress = Some(progress);
                }
                _ = frames.tick(), if playing => {
                    self.editor.tick(Instant::now());
                }
                () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.editor.poll(Instant::now()) {
                        self.start(SynthesisKind::Recompose);
                    }
                }
            }
        }

        info!("all session handles dropped");
        self.editor.detach_peer();
        self.editor.commit()
    }

    #[allow(clippy::too_many_lines)]
    fn apply(&mut self, command: Command, now: Instant) {
        let ed = &mut self.editor;
        match command {
            Command::UpdateLayer { id, patch } => {
                ed.update_layer(&id, &patch, now);
            }
            Command::CreateLayer { kind, x, y } => {
                ed.create_layer(kind, x, y, now);
            }
            Command::DuplicateLayer { id } => {
                ed.duplicate_layer(&id, now);
            }
            Command::RemoveLayer { id } => {
                ed.remove_layer(&id, now);
            }
            Command::ReorderLayer { id, index } => {
                ed.reorder_layer(&id, index, now);
            }
            Command::ToggleVisibility { id } => {
                ed.toggle_visibility(&id, now);
            }
            Command::ToggleLock { id } => {
                ed.toggle_lock(&id, now);
            }
            Command::Nudge { id, dx, dy } => {
                ed.nudge(&id, dx, dy, now);
            }
            Command::Rotate { id, delta } => {
                ed.rotate(&id, delta, now);
            }
            Command::Select { id, additive } => ed.select(id, additive),
            Command::ClearSelection => ed.clear_selection(),
            Command::Align(alignment) => {
                ed.align_selected(alignment, now);
            }
            Command::BeginDrag { id } => {
                ed.begin_drag(&id);
            }
            Command::DragTo { x, y } => {
                ed.drag_to(x, y, now);
            }
            Command::EndDrag => ed.end_drag(),
            Command::Undo => {
                ed.undo(now);
            }
            Command::Redo => {
                ed.redo(now);
            }
            Command::AddKeyframe { layer_id, property, time, value } => {
                if let Err(e) = ed.add_keyframe(&layer_id, property, time, value) {
                    ed.notify(Notice::from_error("Keyframe", &e));
                }
            }
            Command::KeyCurrentValue { layer_id, property } => {
                if let Err(e) = ed.key_current_value(&layer_id, property) {
                    ed.notify(Notice::from_error("Keyframe", &e));
                }
            }
            Command::RemoveKeyframe { layer_id, property, id } => {
                ed.remove_keyframe(&layer_id, property, &id);
            }
            Command::Play => ed.play(now),
            Command::Stop(mode) => ed.stop(mode),
            Command::TogglePlayback => ed.toggle_playback(now),
            Command::Scrub(time) => ed.scrub(time),
            Command::SetDuration(secs) => {
                ed.set_duration(secs);
            }
            Command::MoveCursor { x, y } => ed.move_cursor(x, y),
            Command::SendChat(text) => {
                // Rejections already surface as notices.
                let _ = ed.send_chat(&text);
            }
            Command::SyncNow => self.start(SynthesisKind::Recompose),
            Command::GenerateVariants => self.start(SynthesisKind::Variants),
            Command::GenerateBrandKit => self.start(SynthesisKind::BrandKit),
            Command::View(reply) => {
                let view = View {
                    frame: ed.frame(),
                    current_time: ed.playback().current_time(),
                    playing: ed.playback().is_playing(),
                    synthesizing: ed.is_synthesizing(),
                    progress: self.progress,
                };
                let _ = reply.send(view);
            }
            Command::TakeNotices(reply) => {
                let _ = reply.send(ed.take_notices());
            }
            Command::Commit(reply) => {
                let _ = reply.send(ed.commit());
            }
            // Handled by the loop before dispatch.
            Command::Shutdown(_) => {}
        }
    }

    /// Start a synthesis in a background task, or queue a busy notice.
    fn start(&mut self, kind: SynthesisKind) {
        let ticket = match self.editor.begin_synthesis(kind) {
            Ok(ticket) => ticket,
            Err(e) => {
                debug!(?kind, "synthesis refused while another is outstanding");
                self.editor.notify(Notice::from_error(kind.label(), &e));
                return;
            }
        };
        let synthesizer = self.synthesizer.clone();
        let done = self.done_tx.clone();
        let progress = self.progress_tx.clone();

        tokio::spawn(async move {
            let report = |p: Progress| {
                let _ = progress.try_send(p);
            };
            let result = match ticket.kind {
                SynthesisKind::Recompose => synthesizer
                    .recompose(&ticket.brief, &ticket.source, &ticket.layers)
                    .await
                    .map(SynthesisOutput::Recompose),
                SynthesisKind::Variants => synthesizer
                    .generate_variants(&ticket.brief, &ticket.source, report)
                    .await
                    .map(SynthesisOutput::Variants),
                SynthesisKind::BrandKit => synthesizer
                    .generate_brand_kit(&ticket.brief, &ticket.source, report)
                    .await
                    .map(SynthesisOutput::BrandKit),
            };
            let _ = done.send(Completion { ticket: ticket.id, result }).await;
        });
    }
}

async fn recv_collab(events: &mut Option<mpsc::Receiver<CollabEvent>>) -> Option<CollabEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

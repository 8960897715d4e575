//! Editing core for brand-identity logo compositions.
//!
//! A composition is an ordered stack of layers (icon, wordmark, slogan)
//! over a generated source image. This crate owns everything between the
//! host UI and the image-generation backend: the layer model, undo/redo,
//! snapping and alignment, keyframe animation, same-origin collaboration,
//! and debounced re-synthesis with bounded retry.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`layer`] | Layer records, partial updates, and the z-ordered store |
//! | [`history`] | Bounded undo/redo snapshot stack |
//! | [`debounce`] | Deadline-based debouncer shared by history and sync |
//! | [`geometry`] | Grid snap, smart guides, drag, nudge, align |
//! | [`animation`] | Keyframe tracks, interpolation, easing, playback clock |
//! | [`collab`] | Collaboration events, in-process bus, presence, soft locks |
//! | [`synth`] | Generation backend, prompts, retry, batch synthesizer |
//! | [`composition`] | The persisted aggregate |
//! | [`editor`] | Synchronous orchestrator over all of the above |
//! | [`session`] | Async driver: commands, deadlines, frames, synthesis tasks |
//! | [`notice`] | Transient user notices and the `ErrorCode` trait |
//! | [`config`] | Environment-driven configuration and editor settings |
//! | [`consts`] | Canvas and step constants |

pub mod animation;
pub mod collab;
pub mod composition;
pub mod config;
pub mod consts;
pub mod debounce;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod layer;
pub mod notice;
pub mod session;
pub mod synth;

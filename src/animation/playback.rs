//! Playback clock: a two-state machine (`Stopped`, `Playing`) over the
//! animation timeline.
//!
//! While playing, the playhead is derived from the wall clock as
//! `offset + (now - started_at)`, so frame jitter never accumulates. Reaching
//! the end of the timeline stops playback and rewinds to 0. Scrubbing while
//! playing stops playback first.

#[cfg(test)]
#[path = "playback_test.rs"]
mod playback_test;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Stopped,
    Playing {
        /// Wall-clock instant the current run started.
        started_at: Instant,
        /// Timeline position at `started_at`, in seconds.
        offset: f64,
    },
}

/// What happened on a frame tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Not playing; nothing to render.
    Idle,
    /// Playhead advanced to this time.
    Frame(f64),
    /// The timeline ran out; playback stopped and rewound to 0.
    Finished,
}

/// Whether `stop` keeps or rewinds the playhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    Freeze,
    Reset,
}

#[derive(Debug, Clone)]
pub struct Playback {
    state: PlaybackState,
    current_time: f64,
    duration: f64,
}

impl Playback {
    #[must_use]
    pub fn new(duration: f64) -> Self {
        let duration = if duration.is_finite() { duration.max(f64::EPSILON) } else { 1.0 };
        Self { state: PlaybackState::Stopped, current_time: 0.0, duration }
    }

    /// Start playing from the current playhead. No-op while already playing.
    pub fn play(&mut self, now: Instant) {
        if self.is_playing() {
            return;
        }
        if self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.state = PlaybackState::Playing { started_at: now, offset: self.current_time };
    }

    /// Rewind to 0 and play.
    pub fn restart(&mut self, now: Instant) {
        self.current_time = 0.0;
        self.state = PlaybackState::Playing { started_at: now, offset: 0.0 };
    }

    pub fn stop(&mut self, mode: StopMode) {
        self.state = PlaybackState::Stopped;
        if mode == StopMode::Reset {
            self.current_time = 0.0;
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_playing() {
            self.stop(StopMode::Freeze);
        } else {
            self.play(now);
        }
    }

    /// Advance the playhead from the wall clock.
    pub fn tick(&mut self, now: Instant) -> Tick {
        let PlaybackState::Playing { started_at, offset } = self.state else {
            return Tick::Idle;
        };
        let t = offset + now.saturating_duration_since(started_at).as_secs_f64();
        if t >= self.duration {
            self.stop(StopMode::Reset);
            return Tick::Finished;
        }
        // Never step backwards within one run.
        self.current_time = t.max(self.current_time);
        Tick::Frame(self.current_time)
    }

    /// Set the playhead manually. Stops playback first if it is running.
    /// A non-finite time is ignored.
    pub fn scrub(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        if self.is_playing() {
            self.stop(StopMode::Freeze);
        }
        self.current_time = time.clamp(0.0, self.duration);
    }

    /// Change the timeline length. Non-positive values are ignored.
    pub fn set_duration(&mut self, duration: f64) -> bool {
        if duration <= 0.0 || !duration.is_finite() {
            return false;
        }
        self.duration = duration;
        if self.current_time > duration {
            self.current_time = duration;
        }
        true
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

//! Studio configuration parsed from environment variables.
//!
//! Every knob has a compiled-in default; unparsable values fall back to the
//! default rather than failing startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;
pub const DEFAULT_HISTORY_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_SYNC_DEBOUNCE_MS: u64 = 3000;
pub const DEFAULT_SOFT_LOCK_MS: u64 = 1500;
pub const DEFAULT_FRAME_TICK_MS: u64 = 16;
pub const DEFAULT_SYNTH_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_SYNTH_RETRY_BASE_MS: u64 = 2000;
pub const DEFAULT_ANIMATION_DURATION_SECS: f64 = 3.0;

/// Timing and capacity knobs for one editing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudioConfig {
    /// Maximum retained history snapshots.
    pub history_capacity: usize,
    /// Quiet window before a layer change becomes a history snapshot.
    pub history_debounce: Duration,
    /// Quiet window before an edit triggers re-synthesis.
    pub sync_debounce: Duration,
    /// How long a remote edit keeps its "locked by" marker.
    pub soft_lock: Duration,
    /// Animation frame tick period.
    pub frame_tick: Duration,
    /// Backoff policy for rate-limited backend calls.
    pub retry: RetryPolicy,
    /// Default animation timeline length in seconds.
    pub animation_duration_secs: f64,
}

/// Bounded exponential backoff: attempt `n` (0-based) waits `base * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_SYNTH_RETRY_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_SYNTH_RETRY_BASE_MS),
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_debounce: Duration::from_millis(DEFAULT_HISTORY_DEBOUNCE_MS),
            sync_debounce: Duration::from_millis(DEFAULT_SYNC_DEBOUNCE_MS),
            soft_lock: Duration::from_millis(DEFAULT_SOFT_LOCK_MS),
            frame_tick: Duration::from_millis(DEFAULT_FRAME_TICK_MS),
            retry: RetryPolicy::default(),
            animation_duration_secs: DEFAULT_ANIMATION_DURATION_SECS,
        }
    }
}

impl StudioConfig {
    /// Build the studio config from environment variables.
    ///
    /// Optional:
    /// - `HISTORY_CAPACITY`: default 50
    /// - `HISTORY_DEBOUNCE_MS`: default 500
    /// - `SYNC_DEBOUNCE_MS`: default 3000
    /// - `SOFT_LOCK_MS`: default 1500
    /// - `FRAME_TICK_MS`: default 16
    /// - `SYNTH_RETRY_ATTEMPTS`: default 3
    /// - `SYNTH_RETRY_BASE_MS`: default 2000
    /// - `ANIMATION_DURATION_SECS`: default 3
    #[must_use]
    pub fn from_env() -> Self {
        let duration = env_parse("ANIMATION_DURATION_SECS", DEFAULT_ANIMATION_DURATION_SECS);
        Self {
            history_capacity: env_parse("HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY).max(1),
            history_debounce: Duration::from_millis(env_parse("HISTORY_DEBOUNCE_MS", DEFAULT_HISTORY_DEBOUNCE_MS)),
            sync_debounce: Duration::from_millis(env_parse("SYNC_DEBOUNCE_MS", DEFAULT_SYNC_DEBOUNCE_MS)),
            soft_lock: Duration::from_millis(env_parse("SOFT_LOCK_MS", DEFAULT_SOFT_LOCK_MS)),
            frame_tick: Duration::from_millis(env_parse("FRAME_TICK_MS", DEFAULT_FRAME_TICK_MS).max(1)),
            retry: RetryPolicy {
                max_attempts: env_parse("SYNTH_RETRY_ATTEMPTS", DEFAULT_SYNTH_RETRY_ATTEMPTS).max(1),
                base_delay: Duration::from_millis(env_parse("SYNTH_RETRY_BASE_MS", DEFAULT_SYNTH_RETRY_BASE_MS)),
            },
            animation_duration_secs: if duration > 0.0 { duration } else { DEFAULT_ANIMATION_DURATION_SECS },
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// EDITOR SETTINGS
// =============================================================================

/// Allowed grid densities (lines per canvas side).
pub const GRID_SIZES: [u32; 4] = [8, 12, 16, 32];

/// Per-session canvas settings toggled from the toolbar.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    pub show_grid: bool,
    pub grid_size: u32,
    pub snap_to_grid: bool,
    pub show_smart_guides: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self { show_grid: true, grid_size: 12, snap_to_grid: true, show_smart_guides: true }
    }
}

impl EditorSettings {
    /// Set the grid density, ignoring values outside [`GRID_SIZES`].
    pub fn set_grid_size(&mut self, size: u32) -> bool {
        if GRID_SIZES.contains(&size) {
            self.grid_size = size;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

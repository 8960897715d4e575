//! Notice: the user-visible, auto-dismissing notification.
//!
//! DESIGN
//! ======
//! Failures never escape the editing session as faults. Every error that
//! reaches the orchestrator boundary is turned into a `Notice` carrying a
//! grepable code, the same way structured error frames carry `code` and
//! `retryable` on the wire. No-op conditions (undo at the oldest snapshot,
//! dragging a locked layer) surface as `Info` notices, never as errors.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured notices.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Wall-clock milliseconds since Unix epoch, 0 if the clock is before it.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// NOTICE
// =============================================================================

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient notification for the host UI to display and dismiss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Error code when the notice was produced from a typed error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Whether retrying the same action may succeed.
    pub retryable: bool,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into(), code: None, retryable: false }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into(), code: None, retryable: false }
    }

    /// Build an error notice naming the failed operation in general terms.
    #[must_use]
    pub fn from_error(operation: &str, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: format!("{operation} failed: {err}"),
            code: Some(err.error_code().to_owned()),
            retryable: err.retryable(),
        }
    }
}

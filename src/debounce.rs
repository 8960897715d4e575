//! Deadline-based debouncer.
//!
//! Each `touch` pushes the deadline out by the quiet window; the owner polls
//! `fire_if_due` from its event loop (or sleeps until `deadline`). Rapid
//! touches coalesce into a single firing once the input goes quiet.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { window, deadline: None }
    }

    /// Restart the quiet window from `now`.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Consume the pending firing if its deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending firing regardless of the deadline.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touches_coalesce_until_quiet() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(500));
        d.touch(start);
        d.touch(start + Duration::from_millis(300));
        assert!(!d.fire_if_due(start + Duration::from_millis(600)));
        assert!(d.fire_if_due(start + Duration::from_millis(800)));
        assert!(!d.fire_if_due(start + Duration::from_millis(900)));
    }

    #[test]
    fn flush_and_cancel() {
        let now = Instant::now();
        let mut d = Debouncer::new(Duration::from_secs(3));
        assert!(!d.flush());
        d.touch(now);
        assert!(d.is_pending());
        assert!(d.flush());
        d.touch(now);
        d.cancel();
        assert!(d.deadline().is_none());
    }
}

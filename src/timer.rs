//! One-shot timers on a host-driven clock.
//!
//! Nothing here sleeps. Hosts pass a monotonic `now` (time since start) into
//! every event, call `tick(now)` on the engines, and use the engines'
//! `next_deadline()` to decide how long to wait for input.

use std::time::Duration;

/// A cancellable one-shot timer, the equivalent of a `setTimeout` handle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Duration>,
}

impl Timer {
    /// Arms the timer to fire `delay` after `now`, replacing any earlier arm.
    /// A deadline past `Duration::MAX` never fires.
    pub fn arm(&mut self, now: Duration, delay: Duration) {
        self.deadline = Some(now.checked_add(delay).unwrap_or(Duration::MAX));
    }

    /// Cancels the timer.
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// Returns true while the timer is pending.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Pending deadline, if armed.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Returns true when the timer is armed and its deadline has passed.
    #[must_use]
    pub fn is_due(&self, now: Duration) -> bool {
        self.deadline.is_some_and(|d| d <= now)
    }

    /// Disarms and returns true if the timer is due at `now`.
    pub fn fire(&mut self, now: Duration) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

/// Earliest of several optional deadlines.
pub fn earliest<I>(deadlines: I) -> Option<Duration>
where
    I: IntoIterator<Item = Option<Duration>>,
{
    deadlines.into_iter().flatten().min()
}

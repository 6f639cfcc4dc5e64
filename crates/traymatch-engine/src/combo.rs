//! Finish streak tracking.

use std::time::Duration;

use tokio::time::Instant;

/// Counts finishes that follow each other within a time window.
///
/// A finish within `window` of the previous one extends the streak;
/// otherwise the streak restarts at 1. Once `window` passes without a
/// finish, [`expire`](ComboTracker::expire) resets the streak to 0.
#[derive(Clone, Debug)]
pub struct ComboTracker {
    window: Duration,
    count: u32,
    last: Option<Instant>,
}

impl ComboTracker {
    /// Create a tracker with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            count: 0,
            last: None,
        }
    }

    /// Current streak length.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Record a finish at `now`, returning the new streak length.
    pub fn record(&mut self, now: Instant) -> u32 {
        self.count = match self.last {
            Some(prev) if now.duration_since(prev) < self.window && self.count > 0 => {
                self.count + 1
            }
            _ => 1,
        };
        self.last = Some(now);
        self.count
    }

    /// Reset an expired streak. Returns `true` if the count changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let expired = self
            .last
            .is_some_and(|prev| now.duration_since(prev) >= self.window);
        if expired && self.count > 0 {
            self.count = 0;
            return true;
        }
        false
    }
}

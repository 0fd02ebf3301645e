use std::time::Duration;

use super::types::{elapsed, Timestamp};

/// Counters describing the activity of a detector since creation or the last reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    heartbeats_sent: u64,
    heartbeats_received: u64,
    failures_detected: u64,
    created_at: Timestamp,
}

impl Statistics {
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            created_at,
            ..Self::default()
        }
    }

    pub fn heartbeats_sent(&self) -> u64 {
        self.heartbeats_sent
    }

    pub fn heartbeats_received(&self) -> u64 {
        self.heartbeats_received
    }

    pub fn failures_detected(&self) -> u64 {
        self.failures_detected
    }

    /// Time elapsed since the owning detector was created, unaffected by [`Statistics::reset`].
    pub fn uptime(&self, now: Timestamp) -> Duration {
        elapsed(self.created_at, now)
    }

    /// Zeroes the counters.
    pub fn reset(&mut self) {
        self.heartbeats_sent = 0;
        self.heartbeats_received = 0;
        self.failures_detected = 0;
    }

    pub(crate) fn record_sent(&mut self) {
        self.heartbeats_sent += 1;
    }

    pub(crate) fn record_received(&mut self) {
        self.heartbeats_received += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failures_detected += 1;
    }
}

//! # Timer Module
//!
//! This module defines the `TimeoutQueue` trait, the expiring-timer primitive backing per-peer
//! failure timeouts, together with `DeadlineQueue`, a priority queue implementation of it.
//! Timers are addressed through opaque [`TimerHandle`]s and driven by caller-supplied timestamps.
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::time::Duration;

use super::types::{as_millis, Timestamp};

/// Opaque reference to a single expiring countdown.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TimerHandle {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The `TimeoutQueue` trait abstracts the expiring-timer primitive.
pub trait TimeoutQueue {
    /// Starts a new timer expiring `duration` after `now`. The `label` is descriptive only.
    fn add_timer(&mut self, duration: Duration, label: &str, now: Timestamp) -> TimerHandle;

    /// Cancels and releases a timer. Unknown handles are ignored.
    fn remove_timer(&mut self, handle: TimerHandle);

    /// Restarts the countdown of a timer from `now`, using its original duration.
    fn reset_timer(&mut self, handle: TimerHandle, now: Timestamp);

    /// Returns every timer that expired since the previous poll.
    ///
    /// Each expiration is reported exactly once, the timer stays disarmed until it is reset.
    fn poll_expired(&mut self, now: Timestamp) -> Vec<TimerHandle>;

    /// Returns the time left before the timer expires, `None` if the handle is unknown.
    fn remaining(&self, handle: TimerHandle, now: Timestamp) -> Option<Duration>;
}

#[derive(Clone, Debug)]
struct TimerEntry {
    label: String,
    duration: u64,
    /// `None` once the expiration has been reported.
    deadline: Option<Timestamp>,
    generation: u64,
}

/// A [`TimeoutQueue`] backed by a min-heap of deadlines.
///
/// Resetting a timer pushes a new heap entry instead of searching the old one,
/// stale entries are recognized by their generation and dropped when popped.
#[derive(Clone, Debug, Default)]
pub struct DeadlineQueue {
    next_id: u64,
    timers: HashMap<TimerHandle, TimerEntry>,
    deadlines: BinaryHeap<Reverse<(Timestamp, TimerHandle, u64)>>,
}

impl DeadlineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered timers, armed or not.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn schedule(&mut self, handle: TimerHandle, now: Timestamp) {
        if let Some(entry) = self.timers.get_mut(&handle) {
            let deadline = now.saturating_add(entry.duration);
            entry.generation += 1;
            entry.deadline = Some(deadline);
            self.deadlines
                .push(Reverse((deadline, handle, entry.generation)));
        }
    }
}

impl TimeoutQueue for DeadlineQueue {
    fn add_timer(&mut self, duration: Duration, label: &str, now: Timestamp) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);

        self.timers.insert(
            handle,
            TimerEntry {
                label: label.to_string(),
                duration: as_millis(duration),
                deadline: None,
                generation: 0,
            },
        );
        self.schedule(handle, now);

        handle
    }

    fn remove_timer(&mut self, handle: TimerHandle) {
        self.timers.remove(&handle);
    }

    fn reset_timer(&mut self, handle: TimerHandle, now: Timestamp) {
        self.schedule(handle, now);
    }

    fn poll_expired(&mut self, now: Timestamp) -> Vec<TimerHandle> {
        let mut expired = Vec::new();

        while let Some(Reverse((deadline, handle, generation))) = self.deadlines.peek().copied() {
            if deadline > now {
                break;
            }
            self.deadlines.pop();

            let Some(entry) = self.timers.get_mut(&handle) else {
                continue;
            };
            if entry.generation != generation || entry.deadline.is_none() {
                continue;
            }

            tracing::trace!("timer {} ({}) expired at {}", handle, &entry.label, now);
            entry.deadline = None;
            expired.push(handle);
        }

        expired
    }

    fn remaining(&self, handle: TimerHandle, now: Timestamp) -> Option<Duration> {
        self.timers.get(&handle).map(|entry| match entry.deadline {
            Some(deadline) => Duration::from_millis(deadline.saturating_sub(now)),
            None => Duration::ZERO,
        })
    }
}

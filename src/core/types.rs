use std::time::Duration;

/// Stable integer identity of a participant.
pub type PeerId = u32;

/// Monotonic timestamp in milliseconds.
///
/// The core never reads a clock itself, every operation receives `now` from its caller.
pub type Timestamp = u64;

/// Converts a configured duration into the millisecond scale used by [`Timestamp`].
pub(crate) fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Returns the elapsed time between `earlier` and `now`, clamped at zero.
pub(crate) fn elapsed(earlier: Timestamp, now: Timestamp) -> Duration {
    Duration::from_millis(now.saturating_sub(earlier))
}

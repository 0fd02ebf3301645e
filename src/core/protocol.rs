use std::time::Duration;

use super::member::PeerRegistry;
use super::message::HeartbeatRecord;
use super::stats::Statistics;
use super::timer::TimeoutQueue;
use super::types::{as_millis, PeerId, Timestamp};

/// What applying an inbound heartbeat did to the registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reception {
    /// The sender was unknown and is now monitored.
    Discovered,
    /// The sender was failed and is alive again.
    Revived,
    /// The sender was alive, its timer was restarted.
    Refreshed,
}

/// Outbound cadence and inbound handling of heartbeats.
#[derive(Clone, Debug)]
pub(crate) struct HeartbeatProtocol {
    local_id: PeerId,
    heartbeat_interval: u64,
    sequence_number: u64,
    last_emit: Option<Timestamp>,
}

impl HeartbeatProtocol {
    pub(crate) fn new(local_id: PeerId, heartbeat_interval: Duration) -> Self {
        Self {
            local_id,
            heartbeat_interval: as_millis(heartbeat_interval),
            sequence_number: 0,
            last_emit: None,
        }
    }

    pub(crate) fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Produces the next heartbeat if the interval has elapsed since the previous one.
    /// The very first call always emits.
    pub(crate) fn emit(&mut self, stats: &mut Statistics, now: Timestamp) -> Option<HeartbeatRecord> {
        if let Some(last_emit) = self.last_emit {
            if now.saturating_sub(last_emit) < self.heartbeat_interval {
                return None;
            }
        }

        self.sequence_number += 1;
        self.last_emit = Some(now);
        stats.record_sent();

        tracing::debug!(
            "[{}] emitting heartbeat seq={} at {}",
            self.local_id,
            self.sequence_number,
            now
        );

        Some(HeartbeatRecord::new_heartbeat(
            self.local_id,
            now,
            self.sequence_number,
        ))
    }

    /// Applies an inbound heartbeat, discovering its sender if necessary.
    ///
    /// Heartbeats carrying the local identity are rejected without side effects.
    /// Sequence numbers are stored as received, regressions are accepted.
    pub(crate) fn apply<T: TimeoutQueue>(
        &self,
        registry: &mut PeerRegistry<T>,
        stats: &mut Statistics,
        record: &HeartbeatRecord,
        now: Timestamp,
    ) -> Option<Reception> {
        let sender_id = record.sender_id;
        if sender_id == self.local_id {
            return None;
        }

        stats.record_received();

        let discovered = registry.add_peer(sender_id, now).is_some();
        if discovered {
            tracing::info!("[{}] discovered new peer {}", self.local_id, sender_id);
        }

        let revived = registry
            .refresh(sender_id, record.timestamp, record.sequence_number, now)
            .unwrap_or(false);

        tracing::debug!(
            "[{}] heartbeat from {} seq={} latency={}ms",
            self.local_id,
            sender_id,
            record.sequence_number,
            now.saturating_sub(record.timestamp)
        );

        if discovered {
            Some(Reception::Discovered)
        } else if revived {
            tracing::info!("[{}] peer {} is back online", self.local_id, sender_id);
            Some(Reception::Revived)
        } else {
            Some(Reception::Refreshed)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::core::{
        member::PeerRegistry, message::HeartbeatRecord, stats::Statistics, timer::DeadlineQueue,
    };

    use super::{HeartbeatProtocol, Reception};

    fn create_protocol() -> (HeartbeatProtocol, PeerRegistry<DeadlineQueue>, Statistics) {
        let protocol = HeartbeatProtocol::new(1, Duration::from_millis(1000));
        let registry = PeerRegistry::new(1, Duration::from_millis(3000), DeadlineQueue::new());

        (protocol, registry, Statistics::new(0))
    }

    #[test]
    fn test_protocol_emit_rate_limited() {
        let (mut protocol, _, mut stats) = create_protocol();

        let first = protocol.emit(&mut stats, 0).unwrap();
        assert_eq!(first, HeartbeatRecord::new_heartbeat(1, 0, 1));

        assert!(protocol.emit(&mut stats, 500).is_none());
        assert!(protocol.emit(&mut stats, 999).is_none());
        assert_eq!(stats.heartbeats_sent(), 1);
        assert_eq!(protocol.sequence_number(), 1);

        let second = protocol.emit(&mut stats, 1000).unwrap();
        assert_eq!(second.sequence_number, 2);
        assert_eq!(stats.heartbeats_sent(), 2);
    }

    #[test]
    fn test_protocol_apply_discovers_sender() {
        let (protocol, mut registry, mut stats) = create_protocol();
        let record = HeartbeatRecord::new_heartbeat(2, 0, 5);

        let result = protocol.apply(&mut registry, &mut stats, &record, 0);
        assert_eq!(result, Some(Reception::Discovered));

        let peer = registry.peer(2).unwrap();
        assert!(peer.is_alive());
        assert_eq!(peer.last_sequence_number(), 5);
        assert_eq!(stats.heartbeats_received(), 1);

        let record = HeartbeatRecord::new_heartbeat(2, 1000, 3);
        let result = protocol.apply(&mut registry, &mut stats, &record, 1000);
        assert_eq!(result, Some(Reception::Refreshed));
        assert_eq!(registry.peer(2).unwrap().last_sequence_number(), 3);
    }

    #[test]
    fn test_protocol_apply_rejects_self() {
        let (protocol, mut registry, mut stats) = create_protocol();
        let record = HeartbeatRecord::new_heartbeat(1, 0, 5);

        let result = protocol.apply(&mut registry, &mut stats, &record, 0);
        assert!(result.is_none());
        assert_eq!(registry.total_count(), 0);
        assert_eq!(stats, Statistics::new(0));
    }

    #[test]
    fn test_protocol_apply_revives_failed_peer() {
        let (protocol, mut registry, mut stats) = create_protocol();
        registry.add_peer(2, 0);
        registry.mark_failed(2);

        let record = HeartbeatRecord::new_heartbeat(2, 3100, 1);
        let result = protocol.apply(&mut registry, &mut stats, &record, 3100);

        assert_eq!(result, Some(Reception::Revived));
        assert!(registry.is_alive(2));
        assert!(registry.failed_peers().is_empty());
    }
}

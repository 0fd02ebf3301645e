use std::collections::BTreeSet;
use std::time::Duration;

use crate::api::config::HeartbeatConfig;

use super::member::{PeerRecord, PeerRegistry};
use super::message::HeartbeatRecord;
use super::protocol::{HeartbeatProtocol, Reception};
use super::stats::Statistics;
use super::status::{PeerStatus, StatusReport};
use super::timer::{DeadlineQueue, TimeoutQueue};
use super::types::{elapsed, PeerId, Timestamp};

/// Result of a single [`FailureDetector::run_cycle`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cycle {
    /// The heartbeat to broadcast, if one was due.
    pub heartbeat: Option<HeartbeatRecord>,
    /// Peers that transitioned from alive to failed during this cycle.
    pub failed: Vec<PeerId>,
}

/// Heartbeat-based failure detector.
///
/// Owns the peer registry, the outbound heartbeat state and the statistics of one local node.
/// Every operation is synchronous and takes the current time from its caller.
#[derive(Clone, Debug)]
pub struct FailureDetector<T: TimeoutQueue = DeadlineQueue> {
    local_id: PeerId,
    heartbeat_interval: Duration,
    failure_timeout: Duration,
    registry: PeerRegistry<T>,
    protocol: HeartbeatProtocol,
    stats: Statistics,
}

impl FailureDetector<DeadlineQueue> {
    pub fn new(local_id: PeerId, config: &HeartbeatConfig, now: Timestamp) -> Self {
        Self::with_timeouts(local_id, config, DeadlineQueue::new(), now)
    }
}

impl<T: TimeoutQueue> FailureDetector<T> {
    pub fn with_timeouts(
        local_id: PeerId,
        config: &HeartbeatConfig,
        timeouts: T,
        now: Timestamp,
    ) -> Self {
        let heartbeat_interval = config.heartbeat_interval();
        let failure_timeout = config.failure_timeout();

        tracing::debug!(
            "[{}] failure detector initialized (interval={:?}, timeout={:?})",
            local_id,
            heartbeat_interval,
            failure_timeout
        );

        Self {
            local_id,
            heartbeat_interval,
            failure_timeout,
            registry: PeerRegistry::new(local_id, failure_timeout, timeouts),
            protocol: HeartbeatProtocol::new(local_id, heartbeat_interval),
            stats: Statistics::new(now),
        }
    }

    pub fn local_id(&self) -> PeerId {
        self.local_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.protocol.sequence_number()
    }

    pub fn registry(&self) -> &PeerRegistry<T> {
        &self.registry
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn reset_statistics(&mut self) {
        self.stats.reset();
        tracing::debug!("[{}] statistics reset", self.local_id);
    }

    pub fn add_peer(&mut self, peer_id: PeerId, now: Timestamp) -> Option<&PeerRecord> {
        self.registry.add_peer(peer_id, now)
    }

    pub fn remove_peer(&mut self, peer_id: PeerId) -> Option<PeerRecord> {
        self.registry.remove_peer(peer_id)
    }

    pub fn peer(&self, peer_id: PeerId) -> Option<&PeerRecord> {
        self.registry.peer(peer_id)
    }

    pub fn is_alive(&self, peer_id: PeerId) -> bool {
        self.registry.is_alive(peer_id)
    }

    pub fn alive_peers(&self) -> BTreeSet<PeerId> {
        self.registry.alive_peers()
    }

    pub fn failed_peers(&self) -> BTreeSet<PeerId> {
        self.registry.failed_peers()
    }

    pub fn total_count(&self) -> usize {
        self.registry.total_count()
    }

    pub fn alive_count(&self) -> usize {
        self.registry.alive_count()
    }

    /// Returns the next heartbeat to broadcast if the heartbeat interval has elapsed.
    pub fn emit(&mut self, now: Timestamp) -> Option<HeartbeatRecord> {
        self.protocol.emit(&mut self.stats, now)
    }

    /// Applies an inbound heartbeat and reports what it changed.
    pub fn receive(&mut self, record: &HeartbeatRecord, now: Timestamp) -> Option<Reception> {
        self.protocol
            .apply(&mut self.registry, &mut self.stats, record, now)
    }

    /// Applies an inbound heartbeat. Returns `false` for heartbeats carrying the local identity.
    pub fn apply(&mut self, record: &HeartbeatRecord, now: Timestamp) -> bool {
        self.receive(record, now).is_some()
    }

    /// Marks as failed every alive peer whose timer expired, returning those peers.
    ///
    /// A peer is reported at most once per alive to failed transition.
    pub fn tick(&mut self, now: Timestamp) -> Vec<PeerId> {
        let mut failed = Vec::new();

        for handle in self.registry.poll_expired(now) {
            let Some(peer_id) = self.registry.owner_of(handle) else {
                continue;
            };
            if !self.registry.mark_failed(peer_id) {
                continue;
            }

            self.stats.record_failure();
            failed.push(peer_id);

            let silence = self
                .registry
                .peer(peer_id)
                .map(|record| elapsed(record.last_heartbeat(), now))
                .unwrap_or_default();
            tracing::warn!(
                "[{}] peer {} failed (last seen {:?} ago)",
                self.local_id,
                peer_id,
                silence
            );
        }

        failed
    }

    /// Emits a heartbeat if one is due, then checks for expired peers.
    pub fn run_cycle(&mut self, now: Timestamp) -> Cycle {
        let heartbeat = self.emit(now);
        let failed = self.tick(now);

        if !failed.is_empty() {
            tracing::info!(
                "[{}] failure detected: {} peer(s) failed",
                self.local_id,
                failed.len()
            );
        }

        Cycle { heartbeat, failed }
    }

    pub fn status(&self, now: Timestamp) -> StatusReport {
        let peers = self
            .registry
            .peers()
            .map(|record| PeerStatus {
                peer_id: record.peer_id(),
                display_name: record.display_name().to_string(),
                alive: record.is_alive(),
                since_last_heartbeat: elapsed(record.last_heartbeat(), now),
                remaining_timeout: self
                    .registry
                    .timeouts()
                    .remaining(record.timeout_handle(), now),
                last_sequence_number: record.last_sequence_number(),
            })
            .collect();

        StatusReport {
            local_id: self.local_id,
            heartbeat_interval: self.heartbeat_interval,
            failure_timeout: self.failure_timeout,
            sequence_number: self.sequence_number(),
            total_peers: self.total_count(),
            alive_peers: self.alive_count(),
            failed_peers: self.failed_peers(),
            peers,
            statistics: self.stats,
            uptime: self.stats.uptime(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use crate::{
        api::config::HeartbeatConfig,
        core::{message::HeartbeatRecord, protocol::Reception},
        test_utils::mocks::MockTimeouts,
    };

    use super::FailureDetector;

    fn create_config() -> HeartbeatConfig {
        HeartbeatConfig::builder()
            .with_heartbeat_interval(Duration::from_millis(1000))
            .with_failure_timeout(Duration::from_millis(3000))
            .build()
    }

    fn create_failure_detector() -> FailureDetector {
        FailureDetector::new(1, &create_config(), 0)
    }

    fn create_mocked_failure_detector() -> FailureDetector<MockTimeouts> {
        FailureDetector::with_timeouts(1, &create_config(), MockTimeouts::new(), 0)
    }

    #[test]
    fn test_detection_first_heartbeat_creates_alive_peer() {
        let mut detector = create_failure_detector();

        for peer_id in [2, 7, 42] {
            let record = HeartbeatRecord::new_heartbeat(peer_id, 0, u64::from(peer_id) * 3);
            assert!(detector.apply(&record, 0));

            let peer = detector.peer(peer_id).unwrap();
            assert!(peer.is_alive());
            assert_eq!(peer.last_sequence_number(), u64::from(peer_id) * 3);
        }
        assert_eq!(detector.total_count(), 3);
    }

    #[test]
    fn test_detection_self_heartbeat_has_no_side_effects() {
        let mut detector = create_failure_detector();
        let before = *detector.statistics();

        let record = HeartbeatRecord::new_heartbeat(1, 0, 9);
        assert!(!detector.apply(&record, 0));
        assert!(detector.receive(&record, 10).is_none());

        assert_eq!(detector.total_count(), 0);
        assert!(detector.peer(1).is_none());
        assert_eq!(detector.statistics(), &before);
    }

    #[test]
    fn test_detection_scenario_failure_then_revival() {
        let mut detector = create_failure_detector();

        let record = HeartbeatRecord::new_heartbeat(2, 0, 5);
        assert!(detector.apply(&record, 0));
        assert!(detector.is_alive(2));
        assert_eq!(detector.peer(2).unwrap().last_sequence_number(), 5);

        assert!(detector.tick(2999).is_empty());

        let failed = detector.tick(3000);
        assert_eq!(failed, vec![2]);
        assert_eq!(detector.statistics().failures_detected(), 1);
        assert!(!detector.alive_peers().contains(&2));
        assert_eq!(detector.failed_peers(), BTreeSet::from([2]));

        let record = HeartbeatRecord::new_heartbeat(2, 3100, 6);
        assert_eq!(detector.receive(&record, 3100), Some(Reception::Revived));
        assert!(detector.is_alive(2));
        assert!(detector.failed_peers().is_empty());
        assert_eq!(detector.statistics().failures_detected(), 1);
    }

    #[test]
    fn test_detection_emit_rate_limited() {
        let mut detector = create_failure_detector();

        assert!(detector.emit(0).is_some());
        assert!(detector.emit(500).is_none());
        assert_eq!(detector.statistics().heartbeats_sent(), 1);
        assert_eq!(detector.sequence_number(), 1);
    }

    #[test]
    fn test_detection_failure_reported_once() {
        let mut detector = create_mocked_failure_detector();
        let handle = detector.add_peer(2, 0).unwrap().timeout_handle();

        detector.registry.timeouts().expire(handle);
        assert_eq!(detector.tick(3000), vec![2]);

        detector.registry.timeouts().expire(handle);
        assert!(detector.tick(6000).is_empty());
        assert_eq!(detector.statistics().failures_detected(), 1);
        assert_eq!(detector.failed_peers(), BTreeSet::from([2]));
    }

    #[test]
    fn test_detection_removed_peer_ignores_expiration() {
        let mut detector = create_mocked_failure_detector();
        let handle = detector.add_peer(2, 0).unwrap().timeout_handle();

        let removed = detector.remove_peer(2).unwrap();
        assert_eq!(removed.peer_id(), 2);
        assert!(detector.registry.timeouts().is_released(handle));

        detector.registry.timeouts().expire(handle);
        assert!(detector.tick(3000).is_empty());
        assert!(!detector.is_alive(2));
        assert!(detector.alive_peers().is_empty());
        assert!(detector.failed_peers().is_empty());
        assert_eq!(detector.statistics().failures_detected(), 0);
    }

    #[test]
    fn test_detection_revival_ignores_sequence_order() {
        let mut detector = create_failure_detector();
        detector.apply(&HeartbeatRecord::new_heartbeat(2, 0, 50), 0);
        detector.tick(3000);

        assert!(detector.apply(&HeartbeatRecord::new_heartbeat(2, 3050, 1), 3050));
        assert!(detector.is_alive(2));
        assert_eq!(detector.peer(2).unwrap().last_sequence_number(), 1);
    }

    #[test]
    fn test_detection_heartbeat_postpones_failure() {
        let mut detector = create_failure_detector();
        detector.add_peer(2, 0);

        detector.apply(&HeartbeatRecord::new_heartbeat(2, 2000, 1), 2000);
        assert!(detector.tick(3000).is_empty());
        assert!(detector.tick(4999).is_empty());
        assert_eq!(detector.tick(5000), vec![2]);
    }

    #[test]
    fn test_detection_run_cycle() {
        let mut detector = create_failure_detector();
        detector.add_peer(2, 0);

        let cycle = detector.run_cycle(0);
        assert_eq!(cycle.heartbeat, Some(HeartbeatRecord::new_heartbeat(1, 0, 1)));
        assert!(cycle.failed.is_empty());

        let cycle = detector.run_cycle(500);
        assert!(cycle.heartbeat.is_none());

        let cycle = detector.run_cycle(3000);
        assert_eq!(cycle.heartbeat.unwrap().sequence_number, 2);
        assert_eq!(cycle.failed, vec![2]);
    }

    #[test]
    fn test_detection_reset_statistics_keeps_peers() {
        let mut detector = create_failure_detector();
        detector.emit(0);
        detector.apply(&HeartbeatRecord::new_heartbeat(2, 0, 1), 0);
        detector.tick(3000);

        detector.reset_statistics();

        let stats = detector.statistics();
        assert_eq!(stats.heartbeats_sent(), 0);
        assert_eq!(stats.heartbeats_received(), 0);
        assert_eq!(stats.failures_detected(), 0);
        assert_eq!(detector.failed_peers(), BTreeSet::from([2]));
    }

    #[test]
    fn test_detection_status() {
        let mut detector = create_failure_detector();
        detector.emit(0);
        detector.apply(&HeartbeatRecord::new_heartbeat(2, 0, 4), 0);
        detector.apply(&HeartbeatRecord::new_heartbeat(3, 1000, 8), 1000);
        detector.tick(3000);

        let status = detector.status(3500);
        assert_eq!(status.local_id, 1);
        assert_eq!(status.heartbeat_interval, Duration::from_millis(1000));
        assert_eq!(status.failure_timeout, Duration::from_millis(3000));
        assert_eq!(status.sequence_number, 1);
        assert_eq!(status.total_peers, 2);
        assert_eq!(status.alive_peers, 1);
        assert_eq!(status.failed_count(), 1);
        assert_eq!(status.failed_peers, BTreeSet::from([2]));
        assert_eq!(status.statistics.heartbeats_received(), 2);
        assert_eq!(status.uptime, Duration::from_millis(3500));

        let peer = &status.peers[1];
        assert_eq!(peer.peer_id, 3);
        assert_eq!(peer.display_name, "Node_3");
        assert!(peer.alive);
        assert_eq!(peer.since_last_heartbeat, Duration::from_millis(2500));
        assert_eq!(peer.remaining_timeout, Some(Duration::from_millis(500)));
        assert_eq!(peer.last_sequence_number, 8);
    }
}

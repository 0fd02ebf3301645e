use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use super::timer::{TimeoutQueue, TimerHandle};
use super::types::{PeerId, Timestamp};

/// Liveness record of a single remote peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRecord {
    peer_id: PeerId,
    last_heartbeat: Timestamp,
    last_sender_timestamp: Timestamp,
    last_sequence_number: u64,
    alive: bool,
    timeout_handle: TimerHandle,
    display_name: String,
}

impl PeerRecord {
    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    /// Local time at which the last heartbeat was applied, or the record was created.
    pub fn last_heartbeat(&self) -> Timestamp {
        self.last_heartbeat
    }

    /// The sender's own timestamp carried by the last applied heartbeat.
    pub fn last_sender_timestamp(&self) -> Timestamp {
        self.last_sender_timestamp
    }

    pub fn last_sequence_number(&self) -> u64 {
        self.last_sequence_number
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn timeout_handle(&self) -> TimerHandle {
        self.timeout_handle
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Registry of the peers monitored by the local node.
///
/// Every record owns exactly one timer in the underlying [`TimeoutQueue`],
/// the registry keeps the reverse mapping from timer to peer.
#[derive(Clone, Debug)]
pub struct PeerRegistry<T: TimeoutQueue> {
    local_id: PeerId,
    failure_timeout: Duration,
    peers: BTreeMap<PeerId, PeerRecord>,
    owners: HashMap<TimerHandle, PeerId>,
    timeouts: T,
}

impl<T: TimeoutQueue> PeerRegistry<T> {
    pub fn new(local_id: PeerId, failure_timeout: Duration, timeouts: T) -> Self {
        Self {
            local_id,
            failure_timeout,
            peers: BTreeMap::new(),
            owners: HashMap::new(),
            timeouts,
        }
    }

    pub fn local_id(&self) -> PeerId {
        self.local_id
    }

    pub fn timeouts(&self) -> &T {
        &self.timeouts
    }

    /// Starts monitoring `peer_id`.
    ///
    /// Returns `None` without side effects if `peer_id` is the local identity or already known.
    pub fn add_peer(&mut self, peer_id: PeerId, now: Timestamp) -> Option<&PeerRecord> {
        if peer_id == self.local_id || self.peers.contains_key(&peer_id) {
            return None;
        }

        let display_name = format!("Node_{peer_id}");
        let timeout_handle = self
            .timeouts
            .add_timer(self.failure_timeout, &display_name, now);
        self.owners.insert(timeout_handle, peer_id);

        tracing::debug!(
            "[{}] monitoring {} (timer {})",
            self.local_id,
            &display_name,
            timeout_handle
        );

        let record: &PeerRecord = self.peers.entry(peer_id).or_insert(PeerRecord {
            peer_id,
            last_heartbeat: now,
            last_sender_timestamp: 0,
            last_sequence_number: 0,
            alive: true,
            timeout_handle,
            display_name,
        });

        Some(record)
    }

    /// Stops monitoring `peer_id` and releases its timer.
    pub fn remove_peer(&mut self, peer_id: PeerId) -> Option<PeerRecord> {
        let record = self.peers.remove(&peer_id)?;
        self.timeouts.remove_timer(record.timeout_handle);
        self.owners.remove(&record.timeout_handle);

        tracing::debug!("[{}] removed {}", self.local_id, record.display_name());

        Some(record)
    }

    pub fn peer(&self, peer_id: PeerId) -> Option<&PeerRecord> {
        self.peers.get(&peer_id)
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerRecord> {
        self.peers.values()
    }

    pub fn contains(&self, peer_id: PeerId) -> bool {
        self.peers.contains_key(&peer_id)
    }

    pub fn is_alive(&self, peer_id: PeerId) -> bool {
        self.peers.get(&peer_id).is_some_and(|record| record.alive)
    }

    pub fn alive_peers(&self) -> BTreeSet<PeerId> {
        self.peers_where(true)
    }

    pub fn failed_peers(&self) -> BTreeSet<PeerId> {
        self.peers_where(false)
    }

    pub fn total_count(&self) -> usize {
        self.peers.len()
    }

    pub fn alive_count(&self) -> usize {
        self.peers.values().filter(|record| record.alive).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total_count() - self.alive_count()
    }

    /// Returns the time left before the peer's timer expires.
    pub fn remaining_timeout(&self, peer_id: PeerId, now: Timestamp) -> Option<Duration> {
        let record = self.peers.get(&peer_id)?;
        self.timeouts.remaining(record.timeout_handle, now)
    }

    /// Returns the peer owning `handle`, if any.
    pub(crate) fn owner_of(&self, handle: TimerHandle) -> Option<PeerId> {
        self.owners.get(&handle).copied()
    }

    pub(crate) fn poll_expired(&mut self, now: Timestamp) -> Vec<TimerHandle> {
        self.timeouts.poll_expired(now)
    }

    /// Stores the data of an applied heartbeat and restarts the peer's timer.
    ///
    /// Returns `Some(true)` if the peer was failed and is now alive again.
    pub(crate) fn refresh(
        &mut self,
        peer_id: PeerId,
        sender_timestamp: Timestamp,
        sequence_number: u64,
        now: Timestamp,
    ) -> Option<bool> {
        let record = self.peers.get_mut(&peer_id)?;
        record.last_heartbeat = now;
        record.last_sender_timestamp = sender_timestamp;
        record.last_sequence_number = sequence_number;

        let revived = !record.alive;
        record.alive = true;
        self.timeouts.reset_timer(record.timeout_handle, now);

        Some(revived)
    }

    /// Flips an alive peer to failed. Returns `false` if the peer is unknown or already failed.
    pub(crate) fn mark_failed(&mut self, peer_id: PeerId) -> bool {
        match self.peers.get_mut(&peer_id) {
            Some(record) if record.alive => {
                record.alive = false;
                true
            }
            _ => false,
        }
    }

    fn peers_where(&self, alive: bool) -> BTreeSet<PeerId> {
        self.peers
            .values()
            .filter(|record| record.alive == alive)
            .map(|record| record.peer_id)
            .collect()
    }
}

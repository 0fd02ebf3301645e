use std::collections::BTreeSet;
use std::time::Duration;

use super::stats::Statistics;
use super::types::PeerId;

/// Per-peer detail of a [`StatusReport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerStatus {
    pub peer_id: PeerId,
    pub display_name: String,
    pub alive: bool,
    pub since_last_heartbeat: Duration,
    /// `None` if the peer's timer is unknown to the timeout queue.
    pub remaining_timeout: Option<Duration>,
    pub last_sequence_number: u64,
}

/// Snapshot of a detector, rendered by whatever reports on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub local_id: PeerId,
    pub heartbeat_interval: Duration,
    pub failure_timeout: Duration,
    pub sequence_number: u64,
    pub total_peers: usize,
    pub alive_peers: usize,
    pub failed_peers: BTreeSet<PeerId>,
    pub peers: Vec<PeerStatus>,
    pub statistics: Statistics,
    pub uptime: Duration,
}

impl StatusReport {
    pub fn failed_count(&self) -> usize {
        self.failed_peers.len()
    }
}

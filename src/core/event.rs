use super::types::PeerId;

/// Membership change observed by a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    PeerDiscovered(PeerDiscovered),
    PeerRevived(PeerRevived),
    PeerFailed(PeerFailed),
    PeerRemoved(PeerRemoved),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerDiscovered {
    pub from: PeerId,
    pub peer_id: PeerId,
    /// Address the first heartbeat came from, `None` for peers added explicitly.
    pub addr: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerRevived {
    pub from: PeerId,
    pub peer_id: PeerId,
    pub sequence_number: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerFailed {
    pub from: PeerId,
    pub peer_id: PeerId,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerRemoved {
    pub from: PeerId,
    pub peer_id: PeerId,
}

impl Event {
    pub(crate) fn new_peer_discovered(from: PeerId, peer_id: PeerId, addr: Option<String>) -> Self {
        Event::PeerDiscovered(PeerDiscovered {
            from,
            peer_id,
            addr,
        })
    }

    pub(crate) fn new_peer_revived(from: PeerId, peer_id: PeerId, sequence_number: u64) -> Self {
        Event::PeerRevived(PeerRevived {
            from,
            peer_id,
            sequence_number,
        })
    }

    pub(crate) fn new_peer_failed(from: PeerId, peer_id: PeerId) -> Self {
        Event::PeerFailed(PeerFailed { from, peer_id })
    }

    pub(crate) fn new_peer_removed(from: PeerId, peer_id: PeerId) -> Self {
        Event::PeerRemoved(PeerRemoved { from, peer_id })
    }

    /// Returns the peer the event is about.
    pub fn peer_id(&self) -> PeerId {
        match self {
            Event::PeerDiscovered(e) => e.peer_id,
            Event::PeerRevived(e) => e.peer_id,
            Event::PeerFailed(e) => e.peer_id,
            Event::PeerRemoved(e) => e.peer_id,
        }
    }
}

pub mod api;

mod core;
pub use crate::core::{
    detection::{Cycle, FailureDetector},
    event::{Event, PeerDiscovered, PeerFailed, PeerRemoved, PeerRevived},
    member::{PeerRecord, PeerRegistry},
    message::{HeartbeatRecord, MessageKind},
    node::HeartbeatNode,
    protocol::Reception,
    stats::Statistics,
    status::{PeerStatus, StatusReport},
    timer::{DeadlineQueue, TimeoutQueue, TimerHandle},
    transport::TransportLayer,
    types::{PeerId, Timestamp},
};

pub mod error;
pub use error::Result;

#[cfg(any(test, feature = "test-util"))]
#[path = "./test-utils/mod.rs"]
#[doc(hidden)]
mod test_utils;

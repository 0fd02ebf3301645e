use prost::Message;
use snafu::location;

use crate::error::{Error, Result};

use super::types::{PeerId, Timestamp};

/// Tag identifying the purpose of a message on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MessageKind {
    Unspecified = 0,
    Heartbeat = 1,
}

/// Liveness signal emitted by a node on every heartbeat interval.
#[derive(Clone, Copy, PartialEq, Eq, Hash, prost::Message)]
pub struct HeartbeatRecord {
    #[prost(uint32, tag = "1")]
    pub sender_id: PeerId,
    /// Sender-local monotonic time in milliseconds.
    #[prost(uint64, tag = "2")]
    pub timestamp: Timestamp,
    #[prost(uint64, tag = "3")]
    pub sequence_number: u64,
    #[prost(enumeration = "MessageKind", tag = "4")]
    pub kind: i32,
}

impl HeartbeatRecord {
    pub fn new_heartbeat(sender_id: PeerId, timestamp: Timestamp, sequence_number: u64) -> Self {
        Self {
            sender_id,
            timestamp,
            sequence_number,
            kind: MessageKind::Heartbeat as i32,
        }
    }

    pub fn encode_heartbeat(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;

        Ok(buf)
    }

    /// Decodes a record and checks that it actually is a heartbeat.
    pub fn decode_heartbeat(buf: &[u8]) -> Result<Self> {
        let record = Self::decode(buf)?;

        match MessageKind::try_from(record.kind) {
            Ok(MessageKind::Heartbeat) => Ok(record),
            _ => Err(Error::InvalidData {
                message: format!("unexpected message kind {}", record.kind),
                location: location!(),
            }),
        }
    }
}

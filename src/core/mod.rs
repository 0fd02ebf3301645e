//! # Core Module
//!
//! The `core` module contains the heartbeat failure detector and the runtime driving it.
//! It includes sub-modules for the expiring-timer queue, the peer registry, the heartbeat
//! protocol, failure detection, statistics and status reporting, events, transport abstraction,
//! node orchestration, type definitions, and utility functions.
pub(crate) mod detection;
pub(crate) mod event;
pub(crate) mod member;
pub(crate) mod message;
pub(crate) mod node;
pub(crate) mod protocol;
pub(crate) mod stats;
pub(crate) mod status;
pub(crate) mod timer;
pub(crate) mod transport;
pub(crate) mod types;
mod utils;

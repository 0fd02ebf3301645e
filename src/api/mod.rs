//! # Heartbeat API Module
//!
//! This module provides the primary API for running the heartbeat failure detector on a network.
//! It includes configuration options and the main entry point for creating and managing nodes.
//!
//! ## Modules
//!
//! - [`config`]: Contains configuration structures and builders for customizing heartbeat nodes.
//! - [`cluster`]: Provides the `HeartbeatCluster` struct for initializing and running a node over UDP.
//!
//! ## Tracing Initialization
//!
//! The `init_tracing` function initializes the tracing subscriber for logging purposes.

use lazy_static::lazy_static;
use tracing_subscriber::EnvFilter;

pub mod cluster;
pub mod config;

lazy_static! {
    static ref TRACING: () = {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    };
}

/// Initializes the tracing subscriber for logging.
///
/// This function ensures that the tracing subscriber is only initialized once,
/// and leaves an already installed global subscriber in place.
/// It should be called before running the node to enable logging output.
fn init_tracing() {
    lazy_static::initialize(&TRACING);
}

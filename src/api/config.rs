use std::time::Duration;

/// Default interval between two heartbeats emitted by a node.
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1000);

/// Default failure timeout.
/// If no heartbeat is received from a peer within this duration, the peer is considered `Failed`.
const DEFAULT_FAILURE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Default period of the runtime tick loop driving emission and expiration checks.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// The buffer size for receiving new messages. Defaults to 1536 bytes.
pub(crate) const DEFAULT_BUFFER_SIZE: usize = 1536;

/// Builder for creating a [`HeartbeatConfig`] with customized settings for a heartbeat node.
/// Allows configuring the heartbeat cadence, the failure timeout, and known peers in the network.
#[derive(Clone, Debug)]
pub struct HeartbeatConfigBuilder {
    /// A list of peer node addresses
    /// that this node should send heartbeats to from the start.
    known_peers: Vec<String>,
    /// The minimum duration between consecutive heartbeats.
    heartbeat_interval: Duration,
    /// The duration without heartbeats after which a peer is declared failed.
    failure_timeout: Duration,
    /// The period at which the runtime evaluates emission and expirations.
    tick_interval: Duration,
}

impl HeartbeatConfigBuilder {
    /// Creates a new [`HeartbeatConfigBuilder`] with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the builder and returns a fully constructed [`HeartbeatConfig`].
    pub fn build(self) -> HeartbeatConfig {
        HeartbeatConfig {
            known_peers: self.known_peers,
            heartbeat_interval: self.heartbeat_interval,
            failure_timeout: self.failure_timeout,
            tick_interval: self.tick_interval,
        }
    }

    /// Sets the known peers for this node.
    pub fn with_known_peers<T>(mut self, known_peers: T) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        self.known_peers = known_peers
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        self
    }

    /// Sets the interval between heartbeats emitted by this node.
    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }

    /// Sets the timeout after which a silent peer is declared failed.
    ///
    /// This should exceed the heartbeat interval by a comfortable margin,
    /// a single dropped heartbeat would otherwise cause a spurious failure.
    pub fn with_failure_timeout(mut self, failure_timeout: Duration) -> Self {
        self.failure_timeout = failure_timeout;
        self
    }

    /// Sets the period of the runtime tick loop.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

impl Default for HeartbeatConfigBuilder {
    fn default() -> Self {
        Self {
            known_peers: vec![],
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            failure_timeout: DEFAULT_FAILURE_TIMEOUT,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Configuration for a heartbeat node,
/// used to store parameters such as the heartbeat cadence, the failure timeout, and known peers.
#[derive(Clone, Debug)]
pub struct HeartbeatConfig {
    /// A list of peer node addresses
    /// that this node should send heartbeats to from the start.
    known_peers: Vec<String>,
    /// The minimum duration between consecutive heartbeats.
    heartbeat_interval: Duration,
    /// The duration without heartbeats after which a peer is declared failed.
    failure_timeout: Duration,
    /// The period at which the runtime evaluates emission and expirations.
    tick_interval: Duration,
}

impl HeartbeatConfig {
    /// Creates a new [`HeartbeatConfig`] with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new [`HeartbeatConfigBuilder`] to construct a [`HeartbeatConfig`].
    pub fn builder() -> HeartbeatConfigBuilder {
        HeartbeatConfigBuilder::new()
    }

    /// Returns a reference to the known peers of the node.
    pub fn known_peers(&self) -> &[String] {
        &self.known_peers
    }

    /// Returns the interval between heartbeats.
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Returns the timeout after which a silent peer is declared failed.
    pub fn failure_timeout(&self) -> Duration {
        self.failure_timeout
    }

    /// Returns the period of the runtime tick loop.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        HeartbeatConfigBuilder::new().build()
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::broadcast::{self, Receiver};
use tokio::task::JoinHandle;

use crate::core::event::Event;
use crate::core::node::HeartbeatNode;
use crate::core::status::StatusReport;
use crate::core::types::PeerId;
use crate::error::Result;

use super::config::HeartbeatConfig;
use super::init_tracing;

#[derive(Clone, Debug)]
pub struct HeartbeatCluster {
    node: Arc<HeartbeatNode<UdpSocket>>,
}

impl HeartbeatCluster {
    /// Binds a UDP socket on `addr` and creates the node identified by `local_id`.
    ///
    /// Fails if a known peer is not a valid socket address.
    pub async fn try_new(
        local_id: PeerId,
        addr: impl AsRef<str>,
        config: HeartbeatConfig,
    ) -> Result<Self> {
        for peer in config.known_peers() {
            peer.parse::<SocketAddr>()?;
        }

        let socket = UdpSocket::bind(addr.as_ref()).await?;
        let (tx, _) = broadcast::channel::<Event>(32);
        let node = Arc::new(HeartbeatNode::try_new(local_id, socket, config, tx)?);

        Ok(Self { node })
    }

    pub fn addr(&self) -> &str {
        self.node.addr()
    }

    pub fn local_id(&self) -> PeerId {
        self.node.local_id()
    }

    pub fn config(&self) -> &HeartbeatConfig {
        self.node.config()
    }

    pub fn subscribe(&self) -> Receiver<Event> {
        self.node.subscribe()
    }

    pub async fn status(&self) -> StatusReport {
        self.node.status().await
    }

    pub async fn add_peer(&self, peer_id: PeerId) -> bool {
        self.node.add_peer(peer_id).await
    }

    pub async fn remove_peer(&self, peer_id: PeerId) -> bool {
        self.node.remove_peer(peer_id).await
    }

    pub async fn reset_statistics(&self) {
        self.node.reset_statistics().await
    }

    pub async fn run(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        init_tracing();

        tracing::info!(
            "[{}] starting HeartbeatNode {}...",
            self.node.addr(),
            self.node.local_id()
        );
        self.node.run().await
    }
}

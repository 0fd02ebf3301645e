use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast::{Receiver, Sender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::config::{HeartbeatConfig, DEFAULT_BUFFER_SIZE};
use crate::error::Result;

use super::detection::{Cycle, FailureDetector};
use super::event::Event;
use super::message::HeartbeatRecord;
use super::protocol::Reception;
use super::status::StatusReport;
use super::transport::TransportLayer;
use super::types::{as_millis, PeerId, Timestamp};
use super::utils::send_record;

/// Pause of the receive loop after a failed receive, so a broken socket does not spin.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Drives a [`FailureDetector`] over a transport.
///
/// A tick loop emits heartbeats and checks for expired peers, a receive loop applies inbound
/// heartbeats. Both share the detector behind a single mutex.
#[derive(Debug)]
pub struct HeartbeatNode<T: TransportLayer> {
    addr: String,
    local_id: PeerId,
    socket: Arc<T>,
    config: Arc<HeartbeatConfig>,
    detector: Arc<Mutex<FailureDetector>>,
    peer_addrs: Arc<DashMap<PeerId, String>>,
    tx: Sender<Event>,
    started_at: Instant,
}

impl<T: TransportLayer> Clone for HeartbeatNode<T> {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr.clone(),
            local_id: self.local_id,
            socket: self.socket.clone(),
            config: self.config.clone(),
            detector: self.detector.clone(),
            peer_addrs: self.peer_addrs.clone(),
            tx: self.tx.clone(),
            started_at: self.started_at,
        }
    }
}

impl<T> HeartbeatNode<T>
where
    T: TransportLayer + Send + Sync + 'static,
{
    pub fn try_new(
        local_id: PeerId,
        socket: T,
        config: HeartbeatConfig,
        tx: Sender<Event>,
    ) -> Result<Self> {
        let addr = socket.local_addr()?;
        let detector = FailureDetector::new(local_id, &config, 0);

        tracing::info!(
            "[{}] heartbeat node {} initialized (interval={:?}, timeout={:?})",
            &addr,
            local_id,
            config.heartbeat_interval(),
            config.failure_timeout()
        );

        Ok(Self {
            addr,
            local_id,
            socket: Arc::new(socket),
            config: Arc::new(config),
            detector: Arc::new(Mutex::new(detector)),
            peer_addrs: Arc::new(DashMap::new()),
            tx,
            started_at: Instant::now(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn local_id(&self) -> PeerId {
        self.local_id
    }

    pub fn config(&self) -> &HeartbeatConfig {
        &self.config
    }

    pub fn subscribe(&self) -> Receiver<Event> {
        self.tx.subscribe()
    }

    /// Returns the address a peer last sent a heartbeat from.
    pub fn peer_addr(&self, peer_id: PeerId) -> Option<String> {
        self.peer_addrs.get(&peer_id).map(|entry| entry.value().clone())
    }

    pub async fn status(&self) -> StatusReport {
        let now = self.now();
        self.detector.lock().await.status(now)
    }

    pub async fn reset_statistics(&self) {
        self.detector.lock().await.reset_statistics();
    }

    /// Starts monitoring a peer before any heartbeat was received from it.
    pub async fn add_peer(&self, peer_id: PeerId) -> bool {
        let now = self.now();
        let mut detector = self.detector.lock().await;
        let added = detector.add_peer(peer_id, now).is_some();

        if added {
            self.publish(Event::new_peer_discovered(self.local_id, peer_id, None));
        }

        added
    }

    pub async fn remove_peer(&self, peer_id: PeerId) -> bool {
        let mut detector = self.detector.lock().await;
        let removed = detector.remove_peer(peer_id).is_some();
        self.peer_addrs.remove(&peer_id);

        if removed {
            tracing::info!("[{}] stopped monitoring peer {}", &self.addr, peer_id);
            self.publish(Event::new_peer_removed(self.local_id, peer_id));
        }

        removed
    }

    /// Spawns the tick loop and the receive loop, returning their handles.
    pub async fn run(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        let ticker = self.clone();
        let tick_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(ticker.config.tick_interval());
            loop {
                interval.tick().await;
                ticker.tick().await;
            }
        });

        let receiver = self.clone();
        let dispatch_handle = tokio::spawn(async move {
            loop {
                if let Err(e) = receiver.dispatch().await {
                    tracing::error!("[{}] error while receiving heartbeat: {}", &receiver.addr, e);
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                }
            }
        });

        (tick_handle, dispatch_handle)
    }

    /// Runs one detector cycle, broadcasting the heartbeat if one was due.
    pub(crate) async fn tick(&self) -> Cycle {
        let now = self.now();
        let cycle = {
            let mut detector = self.detector.lock().await;
            let cycle = detector.run_cycle(now);

            // published under the lock so they cannot overtake a concurrent revival
            for peer_id in &cycle.failed {
                self.publish(Event::new_peer_failed(self.local_id, *peer_id));
            }

            cycle
        };

        if let Some(record) = &cycle.heartbeat {
            self.broadcast(record).await;
        }

        cycle
    }

    /// Receives and applies a single heartbeat.
    pub(crate) async fn dispatch(&self) -> Result<Option<Reception>> {
        let mut buf = [0u8; DEFAULT_BUFFER_SIZE];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        let record = HeartbeatRecord::decode_heartbeat(&buf[..len])?;

        let now = self.now();
        let mut detector = self.detector.lock().await;
        let reception = detector.receive(&record, now);

        let Some(reception) = reception else {
            tracing::trace!("[{}] ignoring own heartbeat from {}", &self.addr, &from);
            return Ok(None);
        };

        let peer_id = record.sender_id;
        self.peer_addrs.insert(peer_id, from.clone());

        match reception {
            Reception::Discovered => {
                self.publish(Event::new_peer_discovered(self.local_id, peer_id, Some(from)))
            }
            Reception::Revived => self.publish(Event::new_peer_revived(
                self.local_id,
                peer_id,
                record.sequence_number,
            )),
            Reception::Refreshed => {}
        }

        Ok(Some(reception))
    }

    async fn broadcast(&self, record: &HeartbeatRecord) -> usize {
        let mut sent = 0;

        for target in self.targets() {
            match send_record(&*self.socket, record, &target).await {
                Ok(()) => sent += 1,
                Err(e) => tracing::error!(
                    "[{}] failed to send heartbeat to {}: {}",
                    &self.addr,
                    &target,
                    e
                ),
            }
        }

        sent
    }

    /// Known peers plus every address a heartbeat was received from.
    fn targets(&self) -> BTreeSet<String> {
        self.config
            .known_peers()
            .iter()
            .cloned()
            .chain(self.peer_addrs.iter().map(|entry| entry.value().clone()))
            .filter(|target| target != &self.addr)
            .collect()
    }

    fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::trace!("[{}] no subscribers for event", &self.addr);
        }
    }

    fn now(&self) -> Timestamp {
        as_millis(self.started_at.elapsed())
    }
}

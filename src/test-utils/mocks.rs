use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use snafu::location;
use tokio::net::ToSocketAddrs;
use tokio::sync::{Mutex, Semaphore};

use crate::core::{
    message::HeartbeatRecord,
    timer::{TimeoutQueue, TimerHandle},
    transport::TransportLayer,
    types::Timestamp,
};
use crate::error::{Error, Result};

#[derive(Clone, Debug, Default)]
pub(crate) struct MockUdpSocket {
    transmitted: Arc<Mutex<Vec<HeartbeatRecord>>>,
    inbound: Arc<Mutex<VecDeque<(Vec<u8>, String)>>>,
    recv_attempts: Arc<AtomicUsize>,
    send_gate: Option<Arc<Semaphore>>,
}

impl MockUdpSocket {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every `send_to` waits for a permit of `gate` before recording the datagram.
    pub(crate) fn with_send_gate(gate: Arc<Semaphore>) -> Self {
        Self {
            send_gate: Some(gate),
            ..Self::default()
        }
    }

    pub(crate) fn recv_attempts(&self) -> usize {
        self.recv_attempts.load(Ordering::SeqCst)
    }

    pub(crate) async fn transmitted(&self) -> Vec<HeartbeatRecord> {
        let tx = self.transmitted.lock().await;
        (*tx).clone()
    }

    pub(crate) async fn add_transmitted(&self, record: HeartbeatRecord) {
        let mut tx = self.transmitted.lock().await;
        tx.push(record);
    }

    /// Queues a datagram returned by the next `recv_from`.
    pub(crate) async fn add_inbound(&self, buf: Vec<u8>, from: impl Into<String>) {
        let mut rx = self.inbound.lock().await;
        rx.push_back((buf, from.into()));
    }
}

#[async_trait]
impl TransportLayer for MockUdpSocket {
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, String)> {
        self.recv_attempts.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.inbound.lock().await;
        let Some((datagram, from)) = rx.pop_front() else {
            return Err(Error::Io {
                message: "no inbound datagram".to_string(),
                location: location!(),
            });
        };

        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);

        Ok((len, from))
    }

    async fn send_to<A>(&self, buf: &[u8], _target: A) -> Result<usize>
    where
        A: ToSocketAddrs + Send,
    {
        if let Some(gate) = &self.send_gate {
            let _permit = gate.acquire().await.map_err(|e| Error::Io {
                message: e.to_string(),
                location: location!(),
            })?;
        }

        let record = HeartbeatRecord::decode_heartbeat(buf)?;
        self.add_transmitted(record).await;

        Ok(buf.len())
    }

    fn local_addr(&self) -> Result<String> {
        Ok("MockUdpSocket".to_string())
    }
}

/// A [`TimeoutQueue`] whose expirations are scripted by the test.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockTimeouts {
    next_id: u64,
    active: HashSet<TimerHandle>,
    released: HashSet<TimerHandle>,
    expired: RefCell<Vec<TimerHandle>>,
}

impl MockTimeouts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reports `handle` as expired on the next poll, whether or not it is still registered.
    pub(crate) fn expire(&self, handle: TimerHandle) {
        self.expired.borrow_mut().push(handle);
    }

    pub(crate) fn is_released(&self, handle: TimerHandle) -> bool {
        self.released.contains(&handle) && !self.active.contains(&handle)
    }
}

impl TimeoutQueue for MockTimeouts {
    fn add_timer(&mut self, _duration: Duration, _label: &str, _now: Timestamp) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        self.active.insert(handle);

        handle
    }

    fn remove_timer(&mut self, handle: TimerHandle) {
        if self.active.remove(&handle) {
            self.released.insert(handle);
        }
    }

    fn reset_timer(&mut self, _handle: TimerHandle, _now: Timestamp) {}

    fn poll_expired(&mut self, _now: Timestamp) -> Vec<TimerHandle> {
        self.expired.take()
    }

    fn remaining(&self, handle: TimerHandle, _now: Timestamp) -> Option<Duration> {
        self.active.contains(&handle).then_some(Duration::ZERO)
    }
}

use std::time::Duration;

use heartbeat_rs::{
    api::{cluster::HeartbeatCluster, config::HeartbeatConfig},
    Event, PeerDiscovered, PeerFailed, PeerRemoved, PeerRevived,
};
use tokio::sync::broadcast::error::RecvError;

macro_rules! assert_event {
    ($event:path, $rx:expr, $ms:expr, $assertion:expr) => {
        let result = tokio::time::timeout(Duration::from_millis($ms), async {
            loop {
                match $rx.recv().await {
                    Ok(outer_event) => {
                        if let $event(inner_event) = outer_event {
                            if $assertion(inner_event) {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(_) => panic!(),
                }
            }
        })
        .await;

        if result.is_err() {
            panic!()
        }
    };
}

async fn create_single_node(local_id: u32, known_peers: &[&str]) -> HeartbeatCluster {
    let config = HeartbeatConfig::builder()
        .with_heartbeat_interval(Duration::from_millis(20))
        .with_failure_timeout(Duration::from_millis(150))
        .with_tick_interval(Duration::from_millis(5))
        .with_known_peers(known_peers)
        .build();
    HeartbeatCluster::try_new(local_id, "127.0.0.1:0", config)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_heartbeat_cluster_discovery_events() {
    let node1 = create_single_node(1, &[]).await;
    let node2 = create_single_node(2, &[node1.addr()]).await;

    let mut rx1 = node1.subscribe();
    let mut rx2 = node2.subscribe();

    node1.run().await;
    node2.run().await;

    assert_event!(Event::PeerDiscovered, rx1, 2000, |e: PeerDiscovered| e.peer_id == 2);
    assert_event!(Event::PeerDiscovered, rx2, 2000, |e: PeerDiscovered| e.peer_id == 1);

    let status = node1.status().await;
    assert_eq!(status.local_id, 1);
    assert_eq!(status.total_peers, 1);
    assert!(status.statistics.heartbeats_sent() >= 1);
}

#[tokio::test]
async fn test_heartbeat_cluster_failure_and_revival_events() {
    let node1 = create_single_node(1, &[]).await;
    let node2 = create_single_node(2, &[node1.addr()]).await;

    let mut rx1 = node1.subscribe();

    node1.run().await;
    let handles = node2.run().await;

    assert_event!(Event::PeerDiscovered, rx1, 2000, |e: PeerDiscovered| e.peer_id == 2);

    tracing::info!("[{}] is shutting down...", node2.addr());
    handles.0.abort();
    handles.1.abort();

    assert_event!(Event::PeerFailed, rx1, 2000, |e: PeerFailed| e.peer_id == 2);
    assert!(node1.status().await.failed_peers.contains(&2));

    // same identity, new address
    let node2 = create_single_node(2, &[node1.addr()]).await;
    node2.run().await;

    assert_event!(Event::PeerRevived, rx1, 2000, |e: PeerRevived| e.peer_id == 2);

    let status = node1.status().await;
    assert!(status.failed_peers.is_empty());
    assert!(status.statistics.failures_detected() >= 1);
}

#[tokio::test]
async fn test_heartbeat_cluster_remove_peer() {
    let node1 = create_single_node(1, &[]).await;
    let mut rx1 = node1.subscribe();

    assert!(node1.add_peer(7).await);
    assert!(node1.remove_peer(7).await);

    assert_event!(Event::PeerDiscovered, rx1, 500, |e: PeerDiscovered| e.peer_id == 7
        && e.addr.is_none());
    assert_event!(Event::PeerRemoved, rx1, 500, |e: PeerRemoved| e.peer_id == 7);
    assert_eq!(node1.status().await.total_peers, 0);
}

#[tokio::test]
async fn test_heartbeat_cluster_rejects_invalid_known_peer() {
    let config = HeartbeatConfig::builder()
        .with_known_peers(["not-an-address"])
        .build();

    let result = HeartbeatCluster::try_new(1, "127.0.0.1:0", config).await;
    assert!(result.is_err());
}

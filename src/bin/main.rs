use std::time::Duration;

use heartbeat_rs::{api::cluster::HeartbeatCluster, api::config::HeartbeatConfig, Event, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let mut nodes = Vec::new();

    for i in 0..3u32 {
        let known_peers: &[&str] = if i == 0 { &[] } else { &["127.0.0.1:8080"] };
        let config = HeartbeatConfig::builder()
            .with_known_peers(known_peers)
            .build();
        let addr = format!("127.0.0.1:808{i}");
        nodes.push(HeartbeatCluster::try_new(i + 1, &addr, config).await?);
    }

    let mut rx = nodes[0].subscribe();
    let mut handles = Vec::new();
    for node in &nodes {
        handles.push(node.run().await);
    }

    let observer = nodes[0].clone();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                Event::PeerDiscovered(e) => tracing::info!("[{}] handle {:?}", observer.addr(), e),
                Event::PeerRevived(e) => tracing::info!("[{}] handle {:?}", observer.addr(), e),
                Event::PeerFailed(e) => tracing::warn!("[{}] handle {:?}", observer.addr(), e),
                Event::PeerRemoved(e) => tracing::info!("[{}] handle {:?}", observer.addr(), e),
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(5)).await;

    // simulate a crash of the third node
    if let Some((tick, dispatch)) = handles.pop() {
        tick.abort();
        dispatch.abort();
    }

    tokio::time::sleep(Duration::from_secs(5)).await;

    let status = nodes[0].status().await;
    tracing::info!("[{}] status {:#?}", nodes[0].addr(), status);

    Ok(())
}

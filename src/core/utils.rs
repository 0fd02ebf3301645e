use crate::error::Result;

use super::message::HeartbeatRecord;
use super::transport::TransportLayer;

pub async fn send_record<T: TransportLayer>(
    socket: &T,
    record: &HeartbeatRecord,
    target: impl AsRef<str>,
) -> Result<()> {
    let buf = record.encode_heartbeat()?;

    socket.send_to(&buf, target.as_ref()).await?;

    Ok(())
}

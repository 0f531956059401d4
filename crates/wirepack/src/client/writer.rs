//! Writer task and retry scheduling.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};
use wirepack_protocol::time::unix_now;
use wirepack_protocol::{QoS, WirepackError};

use crate::storage::Storage;

/// Drains due packets from storage on a heartbeat cadence, one per tick.
///
/// For anything above QoS 0 a retry clone is saved *before* the wire write,
/// so a confirmation racing back always finds a queue entry to flip. If the
/// confirmation wins, the clone is discarded lazily; otherwise it becomes due
/// and replays the same framed bytes.
pub(crate) async fn run<W>(
    mut sink: W,
    storage: Arc<dyn Storage>,
    heartbeat: Duration,
    err_tx: mpsc::Sender<WirepackError>,
    mut exit_rx: watch::Receiver<bool>,
) where
    W: AsyncWrite + Unpin + Send,
{
    loop {
        tokio::select! {
            _ = exit_rx.changed() => {
                debug!("writer: exit signal");
                return;
            }
            () = tokio::time::sleep(heartbeat) => {}
        }

        let Some(packet) = storage.unconfirmed() else {
            continue;
        };

        if packet.qos > QoS::AtMostOnce {
            let retry = packet.retry_clone(unix_now());
            trace!(
                msg_id = retry.msg_id,
                retry_times = retry.retry_times,
                due = retry.timestamp,
                "retry scheduled"
            );
            storage.save(retry);
        }

        trace!(
            msg_id = packet.msg_id,
            dup = packet.dup,
            len = packet.buffer.len(),
            "transmitting"
        );
        if let Err(err) = sink.write_all(&packet.buffer).await {
            debug!("writer: {err}");
            let _ = err_tx.send(err.into()).await;
            return;
        }
    }
}

//! Frame reader task.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};
use wirepack_protocol::{decode, Packet, Result, WirepackError, FIXED_HEADER_LEN};

use super::dispatcher::Dispatcher;

/// Reads frames until the transport fails or the epoch is torn down.
///
/// The loop blocks on the transport read; there is no pacing here. Any I/O
/// or decode error is reported once on the error channel and ends the task:
/// after a framing error the byte stream is no longer trustworthy.
pub(crate) async fn run<R>(
    mut stream: R,
    dispatcher: Dispatcher,
    err_tx: mpsc::Sender<WirepackError>,
    mut exit_rx: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin + Send,
{
    loop {
        tokio::select! {
            _ = exit_rx.changed() => {
                debug!("reader: exit signal");
                return;
            }
            result = read_packet(&mut stream) => match result {
                Ok(packet) => {
                    trace!(
                        msg_id = packet.msg_id,
                        msg_type = packet.msg_type,
                        len = packet.total_length,
                        "frame received"
                    );
                    dispatcher.dispatch(packet);
                }
                Err(err) => {
                    debug!("reader: {err}");
                    let _ = err_tx.send(err).await;
                    return;
                }
            }
        }
    }
}

/// Reads exactly one frame: the 5-byte header, then as many payload bytes as
/// the header announces.
async fn read_packet<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Packet> {
    let mut header = [0u8; FIXED_HEADER_LEN];
    stream.read_exact(&mut header).await?;

    let remaining_length = usize::from(u16::from_be_bytes([header[3], header[4]]));
    let mut frame = vec![0u8; FIXED_HEADER_LEN + remaining_length];
    frame[..FIXED_HEADER_LEN].copy_from_slice(&header);
    stream.read_exact(&mut frame[FIXED_HEADER_LEN..]).await?;

    decode(&frame)
}

//! Connection supervision: dial, run an epoch, tear down, redial.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};
use wirepack_protocol::WirepackError;

use super::dispatcher::Dispatcher;
use super::{reader, writer};
use crate::callback::Notifier;
use crate::storage::Storage;
use crate::transport::Transport;

/// Pause between a failed epoch (or failed dial) and the next dial.
pub(crate) const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Sole reconnection authority for one client.
///
/// The reader and writer never attempt recovery: they report the first
/// failure on the error channel and exit. The supervisor broadcasts the exit
/// signal, joins both, surfaces the error to the embedder, and redials.
/// Packets still unconfirmed at teardown stay in storage and are picked up on
/// the new epoch's natural schedule.
pub(crate) struct Supervisor<T: Transport> {
    pub(crate) transport: Arc<T>,
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) notifier: Notifier,
    pub(crate) heartbeat: Duration,
    pub(crate) shutdown: watch::Receiver<bool>,
}

impl<T: Transport + 'static> Supervisor<T> {
    pub(crate) async fn run(mut self) {
        let mut epoch: u64 = 0;
        loop {
            if *self.shutdown.borrow() {
                debug!("supervisor: stopped");
                return;
            }

            match self.transport.connect().await {
                Err(err) => {
                    warn!("dial failed: {err}");
                    self.notifier.fail(err);
                }
                Ok((read_half, write_half)) => {
                    epoch += 1;
                    debug!(epoch, "connection epoch started");
                    match self.run_epoch(read_half, write_half).await {
                        Some(err) => {
                            warn!(epoch, "connection epoch failed: {err}");
                            self.notifier.fail(err);
                        }
                        None => {
                            debug!(epoch, "supervisor: stopped");
                            return;
                        }
                    }
                }
            }

            tokio::select! {
                changed = self.shutdown.changed() => {
                    // A dropped sender means the client handle is gone; stop
                    // supervising rather than redialing unattended.
                    if changed.is_err() {
                        debug!("supervisor: client dropped");
                        return;
                    }
                }
                () = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
        }
    }

    /// Runs one connection epoch. Returns the first task error, or `None`
    /// when the epoch ended because the client was stopped.
    async fn run_epoch(
        &mut self,
        read_half: T::ReadHalf,
        write_half: T::WriteHalf,
    ) -> Option<WirepackError> {
        // Capacity 2: both loops can report without blocking; the first
        // failure wins.
        let (err_tx, mut err_rx) = mpsc::channel(2);
        let (exit_tx, exit_rx) = watch::channel(false);

        let dispatcher = Dispatcher::new(Arc::clone(&self.storage), self.notifier.clone());
        let reader_task = tokio::spawn(reader::run(
            read_half,
            dispatcher,
            err_tx.clone(),
            exit_rx.clone(),
        ));
        let writer_task = tokio::spawn(writer::run(
            write_half,
            Arc::clone(&self.storage),
            self.heartbeat,
            err_tx,
            exit_rx,
        ));

        let outcome = tokio::select! {
            err = err_rx.recv() => err,
            _ = self.shutdown.wait_for(|stopped| *stopped) => None,
        };

        // Both loops observe the exit broadcast at their next select point;
        // the transport halves drop with them, closing the connection.
        let _ = exit_tx.send(true);
        let _ = reader_task.await;
        let _ = writer_task.await;
        outcome
    }
}

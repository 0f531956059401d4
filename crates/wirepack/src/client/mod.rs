//! The embeddable client: options, lifecycle, and the commit path.

pub(crate) mod dispatcher;
pub(crate) mod reader;
pub(crate) mod supervisor;
pub(crate) mod writer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use tracing::debug;
use wirepack_protocol::{encode, MsgType, QoS, Result, WirepackError};

use crate::callback::{DeliveryCallback, Notifier};
use crate::storage::{MemoryStorage, Storage};
use crate::transport::{TcpConfig, TcpTransport, Transport};

/// Writer wake-up cadence when the options leave it unset.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_millis(1000);

/// Informational in-flight budget; exposed but not enforced anywhere.
pub const DEFAULT_MAX_PACKET_NUMBER: usize = 20;

/// Construction options for [`WirepackClient`].
///
/// `address` and `callback` are required; everything else has a default.
#[derive(Default)]
pub struct ClientOptions {
    address: Option<String>,
    callback: Option<DeliveryCallback>,
    heartbeat: Option<Duration>,
    max_packet_number: Option<usize>,
    storage: Option<Arc<dyn Storage>>,
}

impl ClientOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote peer in `host:port` form.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Delivery and failure callback; see [`DeliveryCallback`].
    #[must_use]
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(std::result::Result<Bytes, WirepackError>) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    #[must_use]
    pub fn max_packet_number(mut self, max: usize) -> Self {
        self.max_packet_number = Some(max);
        self
    }

    /// Substitutes a storage backend for the in-memory default.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }
}

/// Reliable delivery client over one supervised connection.
///
/// `start` launches the connection supervisor in the background; `commit`
/// queues payloads for delivery whether or not a connection is currently up.
/// All asynchronous failures surface through the callback; the only
/// synchronous error is a configuration problem at construction.
pub struct WirepackClient<T: Transport = TcpTransport> {
    transport: Arc<T>,
    storage: Arc<dyn Storage>,
    notifier: Notifier,
    heartbeat: Duration,
    max_packet_number: usize,
    shutdown: watch::Sender<bool>,
    started: AtomicBool,
}

impl WirepackClient<TcpTransport> {
    /// Builds a client over TCP.
    ///
    /// # Errors
    ///
    /// Returns `WirepackError::Configuration` if the address or callback is
    /// missing.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let address = options
            .address
            .clone()
            .ok_or_else(|| WirepackError::Configuration("address is required".to_string()))?;
        Self::with_transport(TcpTransport::new(TcpConfig::new(address)), options)
    }
}

impl<T: Transport + 'static> WirepackClient<T> {
    /// Builds a client over a custom transport. The `address` option is not
    /// consulted; the transport already knows where to dial.
    ///
    /// # Errors
    ///
    /// Returns `WirepackError::Configuration` if the callback is missing.
    pub fn with_transport(transport: T, options: ClientOptions) -> Result<Self> {
        let callback = options
            .callback
            .ok_or_else(|| WirepackError::Configuration("callback is required".to_string()))?;
        let storage = options
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            transport: Arc::new(transport),
            storage,
            notifier: Notifier::new(callback),
            heartbeat: options.heartbeat.unwrap_or(DEFAULT_HEARTBEAT),
            max_packet_number: options.max_packet_number.unwrap_or(DEFAULT_MAX_PACKET_NUMBER),
            shutdown,
            started: AtomicBool::new(false),
        })
    }

    /// Launches the connection supervisor in the background. Idempotent;
    /// later calls are ignored.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("client already started");
            return;
        }
        let supervisor = supervisor::Supervisor {
            transport: Arc::clone(&self.transport),
            storage: Arc::clone(&self.storage),
            notifier: self.notifier.clone(),
            heartbeat: self.heartbeat,
            shutdown: self.shutdown.subscribe(),
        };
        tokio::spawn(supervisor.run());
    }

    /// Frames `payload` as a SEND at `qos` and queues it for delivery.
    ///
    /// The packet is immediately due; the writer transmits it on its next
    /// heartbeat once a connection is up. At QoS 1 and 2 it is retransmitted
    /// with linear backoff until the peer confirms.
    pub fn commit(&self, payload: impl Into<Bytes>, qos: QoS) {
        let msg_id = self.storage.unique_id();
        let packet = encode(MsgType::Send, qos, false, msg_id, payload);
        debug!(msg_id, ?qos, len = packet.payload.len(), "commit");
        self.storage.save(packet);
    }

    /// Stops redialing and tears down the current connection epoch.
    pub fn stop(&self) {
        debug!("client stop requested");
        let _ = self.shutdown.send(true);
    }

    /// The informational in-flight budget carried from the options.
    #[must_use]
    pub fn max_packet_number(&self) -> usize {
        self.max_packet_number
    }
}

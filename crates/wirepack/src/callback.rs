use std::sync::Arc;

use bytes::Bytes;
use wirepack_protocol::WirepackError;

/// Callback the embedder supplies at construction.
///
/// Invoked with `Ok(payload)` once per delivered inbound message and with
/// `Err(e)` once per asynchronous transport failure (dial failed, read or
/// write failed). Callbacks run on whichever task triggered the event and
/// must not call back into the client.
pub type DeliveryCallback = Arc<dyn Fn(Result<Bytes, WirepackError>) + Send + Sync>;

/// Cloneable handle the reader and supervisor use to reach the embedder.
#[derive(Clone)]
pub(crate) struct Notifier {
    callback: DeliveryCallback,
}

impl Notifier {
    pub(crate) fn new(callback: DeliveryCallback) -> Self {
        Self { callback }
    }

    pub(crate) fn deliver(&self, payload: Bytes) {
        (self.callback)(Ok(payload));
    }

    pub(crate) fn fail(&self, err: WirepackError) {
        (self.callback)(Err(err));
    }
}

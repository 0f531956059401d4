//! Storage layer for in-flight packet persistence.
//!
//! The client owns every live packet through a [`Storage`] implementation:
//! outbound frames wait here until the writer pops them, retry clones park
//! here until they become due, and QoS 2 inbound payloads are buffered here
//! between SEND and RELEASE. The in-memory backend ships by default; durable
//! backends plug in through the same trait.

pub mod memory;

pub use memory::MemoryStorage;

use bytes::Bytes;
use wirepack_protocol::Packet;

/// Capability contract for packet stores.
///
/// Implementations are shared by the reader, writer, and supervisor tasks and
/// must be internally synchronized. Operations are infallible; a backend that
/// can fail internally must resolve the failure itself. No lock may be held
/// across I/O or a user callback.
pub trait Storage: Send + Sync {
    /// Allocates the next message id: monotonic per process lifetime,
    /// wrapping modulo 2^16. Wraparound collisions are not defended.
    fn unique_id(&self) -> u16;

    /// Inserts a packet into the retry queue.
    fn save(&self, packet: Packet);

    /// Pops the next due, unconfirmed packet.
    ///
    /// Confirmed packets encountered on the way out are discarded lazily. A
    /// packet whose timestamp is still in the future stays parked and `None`
    /// is returned: nothing is due.
    fn unconfirmed(&self) -> Option<Packet>;

    /// Flips `confirm` on the queued packet with this id, in place, and
    /// restores queue order. Returns the packet as now queued, or `None` if
    /// no packet with that id is pending.
    fn confirm(&self, id: u16) -> Option<Packet>;

    /// Buffers a QoS 2 inbound payload until its RELEASE arrives.
    fn receive(&self, id: u16, payload: Bytes);

    /// Removes and returns a buffered QoS 2 payload. Returns it exactly once:
    /// a second call for the same id yields `None`.
    fn release(&self, id: u16) -> Option<Bytes>;
}

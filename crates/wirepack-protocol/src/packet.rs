use bytes::Bytes;

use crate::codec;
use crate::types::{MsgType, QoS};

/// Linear backoff step between retransmissions, in seconds. The n-th retry
/// becomes due `n * RETRY_INTERVAL_SECS` after it is scheduled.
pub const RETRY_INTERVAL_SECS: i64 = 5;

/// One protocol frame plus the scheduler metadata that tracks it while it is
/// in flight.
///
/// The wire fields mirror the codec layout; `buffer` holds the complete
/// framed bytes so the writer (and any retransmission) writes without
/// re-encoding. `confirm`, `retry_times`, and `timestamp` never cross the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Raw message type nibble. Unrecognized values survive decoding and are
    /// dropped at dispatch, so this stays a plain byte rather than [`MsgType`].
    pub msg_type: u8,
    pub qos: QoS,
    /// Retransmission flag as carried on the wire.
    pub dup: bool,
    pub msg_id: u16,
    /// Payload length as announced in the header.
    pub remaining_length: u16,
    /// Header plus payload; up to 65 540 bytes.
    pub total_length: u32,
    pub payload: Bytes,
    /// The fully framed wire bytes.
    pub buffer: Bytes,

    /// Set when the peer has acknowledged; the queue drops the packet lazily.
    pub confirm: bool,
    /// How many retransmissions have been scheduled for this exchange.
    pub retry_times: u32,
    /// Earliest time (seconds since epoch) the packet becomes due. Zero means
    /// immediately.
    pub timestamp: i64,
}

impl Packet {
    /// Whether the scheduler may hand this packet to the writer.
    #[must_use]
    pub fn is_due(&self, now: i64) -> bool {
        self.timestamp <= now
    }

    /// Builds the clone that replays this packet if no confirmation arrives.
    ///
    /// The first retry re-encodes the frame with the dup flag set; later
    /// retries reuse the already-flagged buffer and only bump the counter.
    /// The clone becomes due `retry_times * RETRY_INTERVAL_SECS` seconds from
    /// `now`.
    #[must_use]
    pub fn retry_clone(&self, now: i64) -> Packet {
        let mut clone = match (self.retry_times, MsgType::from_u8(self.msg_type)) {
            (0, Some(msg_type)) => {
                codec::encode(msg_type, self.qos, true, self.msg_id, self.payload.clone())
            }
            _ => self.clone(),
        };
        clone.retry_times = self.retry_times + 1;
        clone.timestamp = now + RETRY_INTERVAL_SECS * i64::from(clone.retry_times);
        clone
    }
}

//! Framing codec for the wirepack wire format.
//!
//! Every frame is a fixed 5-byte header followed by the payload, big-endian
//! throughout:
//!
//! | offset | size | field                                      |
//! |--------|------|--------------------------------------------|
//! | 0      | 1    | `(msg_type << 4) \| (qos << 2) \| (dup << 1)` |
//! | 1      | 2    | message id                                 |
//! | 3      | 2    | remaining length (= payload length)        |
//! | 5      | n    | payload                                    |
//!
//! The low bit of the header byte is reserved: written as 0, ignored on
//! decode.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WirepackError};
use crate::packet::Packet;
use crate::types::{MsgType, QoS};

/// Wire size of the fixed header: flags byte, message id, remaining length.
pub const FIXED_HEADER_LEN: usize = 5;

/// Frames a packet for the wire.
///
/// The returned [`Packet`] carries both the decoded fields and the fully
/// framed `buffer`, so retransmissions never re-encode. Scheduler metadata is
/// zeroed: the packet is immediately due and has never been retried.
///
/// # Panics
///
/// Panics if `payload` exceeds the 65 535-byte frame limit.
#[must_use]
pub fn encode(msg_type: MsgType, qos: QoS, dup: bool, msg_id: u16, payload: impl Into<Bytes>) -> Packet {
    let payload = payload.into();
    assert!(
        payload.len() <= usize::from(u16::MAX),
        "payload exceeds maximum frame size"
    );
    #[allow(clippy::cast_possible_truncation)]
    let remaining_length = payload.len() as u16;

    let fixed_header = (u8::from(msg_type) << 4) | (u8::from(qos) << 2) | (u8::from(dup) << 1);
    let mut buffer = BytesMut::with_capacity(FIXED_HEADER_LEN + payload.len());
    buffer.put_u8(fixed_header);
    buffer.put_u16(msg_id);
    buffer.put_u16(remaining_length);
    buffer.put_slice(&payload);

    Packet {
        msg_type: u8::from(msg_type),
        qos,
        dup,
        msg_id,
        remaining_length,
        total_length: FIXED_HEADER_LEN as u32 + u32::from(remaining_length),
        payload,
        buffer: buffer.freeze(),
        confirm: false,
        retry_times: 0,
        timestamp: 0,
    }
}

/// Parses one frame from `buf`.
///
/// Fails only structurally: fewer than [`FIXED_HEADER_LEN`] bytes, or fewer
/// payload bytes than the header announces. An unrecognized message type is
/// not an error here; the raw type byte is preserved so dispatch can drop the
/// frame (forward compatibility).
pub fn decode(buf: &[u8]) -> Result<Packet> {
    if buf.len() < FIXED_HEADER_LEN {
        return Err(WirepackError::Decode("truncated fixed header".to_string()));
    }

    let fixed_header = buf[0];
    let msg_type = fixed_header >> 4;
    let qos = QoS::from((fixed_header & 0x0f) >> 2);
    let dup = fixed_header & 0b10 != 0;
    let msg_id = u16::from_be_bytes([buf[1], buf[2]]);
    let remaining_length = u16::from_be_bytes([buf[3], buf[4]]);

    let total_length = FIXED_HEADER_LEN + usize::from(remaining_length);
    if buf.len() < total_length {
        return Err(WirepackError::Decode("truncated payload".to_string()));
    }

    Ok(Packet {
        msg_type,
        qos,
        dup,
        msg_id,
        remaining_length,
        total_length: total_length as u32,
        payload: Bytes::copy_from_slice(&buf[FIXED_HEADER_LEN..total_length]),
        buffer: Bytes::copy_from_slice(&buf[..total_length]),
        confirm: false,
        retry_times: 0,
        timestamp: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_qos0_send_literal_bytes() {
        let packet = encode(MsgType::Send, QoS::AtMostOnce, false, 1, vec![0x68, 0x69]);
        assert_eq!(
            packet.buffer.as_ref(),
            &[0x10, 0x00, 0x01, 0x00, 0x02, 0x68, 0x69]
        );
        assert_eq!(packet.remaining_length, 2);
        assert_eq!(packet.total_length, 7);
        assert_eq!(packet.timestamp, 0);
        assert_eq!(packet.retry_times, 0);
        assert!(!packet.confirm);
    }

    #[test]
    fn test_header_bit_packing() {
        let packet = encode(MsgType::Release, QoS::AtLeastOnce, true, 0x1234, Bytes::new());
        // (4 << 4) | (1 << 2) | (1 << 1)
        assert_eq!(packet.buffer[0], 0x46);
        assert_eq!(&packet.buffer[1..3], &[0x12, 0x34]);
    }

    #[test]
    fn test_round_trip_identity() {
        let original = encode(
            MsgType::Send,
            QoS::ExactlyOnce,
            true,
            40_000,
            Bytes::from_static(b"payload bytes"),
        );
        let decoded = decode(&original.buffer).unwrap();

        assert_eq!(decoded.msg_type, u8::from(MsgType::Send));
        assert_eq!(decoded.qos, QoS::ExactlyOnce);
        assert!(decoded.dup);
        assert_eq!(decoded.msg_id, 40_000);
        assert_eq!(decoded.payload, original.payload);
        assert_eq!(decoded.buffer, original.buffer);

        // Scheduler metadata is out-of-band and zero after a round trip.
        assert!(!decoded.confirm);
        assert_eq!(decoded.retry_times, 0);
        assert_eq!(decoded.timestamp, 0);
    }

    #[test]
    fn test_empty_payload() {
        let packet = encode(MsgType::Ack, QoS::AtMostOnce, false, 7, Bytes::new());
        assert_eq!(packet.remaining_length, 0);
        assert_eq!(packet.total_length, 5);
        assert_eq!(packet.buffer.as_ref(), &[0x20, 0x00, 0x07, 0x00, 0x00]);

        let decoded = decode(&packet.buffer).unwrap();
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_maximum_payload() {
        let payload = vec![0xAB; usize::from(u16::MAX)];
        let packet = encode(MsgType::Send, QoS::AtMostOnce, false, 1, payload);
        assert_eq!(packet.remaining_length, 0xFFFF);
        assert_eq!(packet.total_length, 65_540);
        assert_eq!(packet.buffer.len(), 65_540);

        let decoded = decode(&packet.buffer).unwrap();
        assert_eq!(decoded.payload.len(), usize::from(u16::MAX));
    }

    #[test]
    fn test_decode_short_header() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[0x10]).is_err());
        assert!(decode(&[0x10, 0x00, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_decode_short_payload() {
        // Header announces 3 payload bytes, only 2 follow.
        let result = decode(&[0x10, 0x00, 0x01, 0x00, 0x03, 0x41, 0x42]);
        match result {
            Err(WirepackError::Decode(msg)) => assert!(msg.contains("payload")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_reserved_bit_ignored() {
        let mut frame = encode(MsgType::Send, QoS::AtMostOnce, false, 3, Bytes::new())
            .buffer
            .to_vec();
        frame[0] |= 0x01;
        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.msg_id, 3);
        assert!(!decoded.dup);
    }

    #[test]
    fn test_decode_unknown_msg_type_survives() {
        // Type nibble 9 is not part of the protocol but decodes structurally.
        let decoded = decode(&[0x90, 0x00, 0x05, 0x00, 0x00]).unwrap();
        assert_eq!(decoded.msg_type, 9);
        assert_eq!(MsgType::from_u8(decoded.msg_type), None);
    }

    #[test]
    fn test_decode_invalid_qos_bits_degrade() {
        // qos bits = 3 is unassigned and reads as at-most-once.
        let decoded = decode(&[0x1C, 0x00, 0x01, 0x00, 0x00]).unwrap();
        assert_eq!(decoded.qos, QoS::AtMostOnce);
    }
}

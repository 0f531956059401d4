/// The five message types that compose the delivery handshakes.
///
/// SEND carries an application payload; the other four are the
/// acknowledgement legs of the QoS 1 (`SEND`/`ACK`) and QoS 2
/// (`SEND`/`RECEIVED`/`RELEASE`/`COMPLETED`) exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    Send = 1,
    Ack = 2,
    Received = 3,
    Release = 4,
    Completed = 5,
}

impl MsgType {
    /// Converts a raw type nibble. Returns `None` for values outside the
    /// protocol, which callers drop for forward compatibility.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(MsgType::Send),
            2 => Some(MsgType::Ack),
            3 => Some(MsgType::Received),
            4 => Some(MsgType::Release),
            5 => Some(MsgType::Completed),
            _ => None,
        }
    }
}

impl From<MsgType> for u8 {
    fn from(msg_type: MsgType) -> Self {
        msg_type as u8
    }
}

/// Quality-of-service level of a SEND exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum QoS {
    /// At most once: fire and forget.
    AtMostOnce = 0,
    /// At least once: retransmitted until acknowledged.
    AtLeastOnce = 1,
    /// Exactly once: two-phase handshake.
    ExactlyOnce = 2,
}

impl From<u8> for QoS {
    fn from(value: u8) -> Self {
        match value {
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::AtMostOnce,
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        qos as u8
    }
}

//! Inbound dispatch: the receiving side of the QoS handshakes.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};
use wirepack_protocol::{encode, MsgType, Packet, QoS};

use crate::callback::Notifier;
use crate::storage::Storage;

/// Reacts to each inbound packet.
///
/// Replies are queued through storage so the writer transmits them on its own
/// schedule; confirmations repair the retry queue in place; payloads reach
/// the embedder exactly as the QoS level promises. For QoS 2 the reply is
/// always queued before the callback fires, so a duplicate inbound frame
/// observes a settled side map.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    storage: Arc<dyn Storage>,
    notifier: Notifier,
}

impl Dispatcher {
    pub(crate) fn new(storage: Arc<dyn Storage>, notifier: Notifier) -> Self {
        Self { storage, notifier }
    }

    pub(crate) fn dispatch(&self, packet: Packet) {
        let Some(msg_type) = MsgType::from_u8(packet.msg_type) else {
            trace!(
                msg_type = packet.msg_type,
                msg_id = packet.msg_id,
                "ignoring unknown message type"
            );
            return;
        };

        match msg_type {
            MsgType::Send => self.on_send(packet),
            MsgType::Ack | MsgType::Completed => {
                self.storage.confirm(packet.msg_id);
            }
            MsgType::Received => {
                self.storage.confirm(packet.msg_id);
                // RELEASE itself rides at QoS 1: it is retransmitted until
                // the peer answers COMPLETED.
                self.reply(MsgType::Release, QoS::AtLeastOnce, packet.msg_id);
            }
            MsgType::Release => self.on_release(packet.msg_id),
        }
    }

    fn on_send(&self, packet: Packet) {
        match packet.qos {
            QoS::AtMostOnce => self.notifier.deliver(packet.payload),
            QoS::AtLeastOnce => {
                // A retransmitted SEND re-fires the callback: at-least-once
                // delivery does not deduplicate.
                self.reply(MsgType::Ack, QoS::AtMostOnce, packet.msg_id);
                self.notifier.deliver(packet.payload);
            }
            QoS::ExactlyOnce => {
                self.storage.receive(packet.msg_id, packet.payload);
                self.reply(MsgType::Received, QoS::AtMostOnce, packet.msg_id);
            }
        }
    }

    fn on_release(&self, msg_id: u16) {
        let released = self.storage.release(msg_id);
        self.reply(MsgType::Completed, QoS::AtMostOnce, msg_id);
        match released {
            Some(payload) => self.notifier.deliver(payload),
            None => debug!(msg_id, "duplicate release, payload already delivered"),
        }
    }

    fn reply(&self, msg_type: MsgType, qos: QoS, msg_id: u16) {
        self.storage.save(encode(msg_type, qos, false, msg_id, Bytes::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use parking_lot::Mutex;
    use wirepack_protocol::decode;

    struct Fixture {
        dispatcher: Dispatcher,
        storage: Arc<MemoryStorage>,
        delivered: Arc<Mutex<Vec<Bytes>>>,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        let notifier = Notifier::new(Arc::new(move |event| {
            sink.lock().push(event.expect("dispatch only delivers payloads"));
        }));
        Fixture {
            dispatcher: Dispatcher::new(
                Arc::clone(&storage) as Arc<dyn Storage>,
                notifier,
            ),
            storage,
            delivered,
        }
    }

    fn inbound(msg_type: MsgType, qos: QoS, msg_id: u16, payload: &'static [u8]) -> Packet {
        let framed = encode(msg_type, qos, false, msg_id, Bytes::from_static(payload));
        decode(&framed.buffer).unwrap()
    }

    #[test]
    fn test_send_qos0_delivers_without_reply() {
        let fx = fixture();
        fx.dispatcher
            .dispatch(inbound(MsgType::Send, QoS::AtMostOnce, 7, b"ABC"));

        assert_eq!(fx.delivered.lock().as_slice(), &[Bytes::from_static(b"ABC")]);
        assert_eq!(fx.storage.queue_len(), 0);
    }

    #[test]
    fn test_send_qos1_acks_and_delivers() {
        let fx = fixture();
        fx.dispatcher
            .dispatch(inbound(MsgType::Send, QoS::AtLeastOnce, 7, b"ABC"));

        assert_eq!(fx.delivered.lock().len(), 1);
        let reply = fx.storage.unconfirmed().expect("an ACK is queued");
        assert_eq!(MsgType::from_u8(reply.msg_type), Some(MsgType::Ack));
        assert_eq!(reply.qos, QoS::AtMostOnce);
        assert_eq!(reply.msg_id, 7);
        assert!(reply.payload.is_empty());
    }

    #[test]
    fn test_send_qos1_duplicate_redelivers() {
        let fx = fixture();
        let frame = inbound(MsgType::Send, QoS::AtLeastOnce, 7, b"ABC");
        fx.dispatcher.dispatch(frame.clone());
        fx.dispatcher.dispatch(frame);

        // At-least-once: the callback fires per SEND, duplicates included.
        assert_eq!(fx.delivered.lock().len(), 2);
    }

    #[test]
    fn test_send_qos2_buffers_and_replies_received() {
        let fx = fixture();
        fx.dispatcher
            .dispatch(inbound(MsgType::Send, QoS::ExactlyOnce, 9, b"X"));

        // No delivery until the RELEASE arrives.
        assert!(fx.delivered.lock().is_empty());
        assert_eq!(fx.storage.pending_inbound(), 1);

        let reply = fx.storage.unconfirmed().expect("a RECEIVED is queued");
        assert_eq!(MsgType::from_u8(reply.msg_type), Some(MsgType::Received));
        assert_eq!(reply.msg_id, 9);
    }

    #[test]
    fn test_release_delivers_exactly_once() {
        let fx = fixture();
        fx.dispatcher
            .dispatch(inbound(MsgType::Send, QoS::ExactlyOnce, 9, b"X"));
        fx.storage.unconfirmed(); // drain the RECEIVED

        fx.dispatcher
            .dispatch(inbound(MsgType::Release, QoS::AtLeastOnce, 9, b""));
        assert_eq!(fx.delivered.lock().as_slice(), &[Bytes::from_static(b"X")]);
        assert_eq!(fx.storage.pending_inbound(), 0);
        let completed = fx.storage.unconfirmed().expect("a COMPLETED is queued");
        assert_eq!(MsgType::from_u8(completed.msg_type), Some(MsgType::Completed));

        // A duplicate RELEASE re-emits COMPLETED but never the payload.
        fx.dispatcher
            .dispatch(inbound(MsgType::Release, QoS::AtLeastOnce, 9, b""));
        assert_eq!(fx.delivered.lock().len(), 1);
        let completed = fx.storage.unconfirmed().expect("COMPLETED re-queued");
        assert_eq!(MsgType::from_u8(completed.msg_type), Some(MsgType::Completed));
    }

    #[test]
    fn test_ack_confirms_pending_send() {
        let fx = fixture();
        let send = encode(MsgType::Send, QoS::AtLeastOnce, false, 3, Bytes::from_static(b"m"));
        fx.storage.save(send);

        fx.dispatcher.dispatch(inbound(MsgType::Ack, QoS::AtMostOnce, 3, b""));
        assert_eq!(fx.storage.unconfirmed(), None);
        assert_eq!(fx.storage.queue_len(), 0);
    }

    #[test]
    fn test_received_confirms_and_queues_release() {
        let fx = fixture();
        let send = encode(MsgType::Send, QoS::ExactlyOnce, false, 4, Bytes::from_static(b"Q"));
        fx.storage.save(send);

        fx.dispatcher
            .dispatch(inbound(MsgType::Received, QoS::AtMostOnce, 4, b""));

        let release = fx.storage.unconfirmed().expect("a RELEASE is queued");
        assert_eq!(MsgType::from_u8(release.msg_type), Some(MsgType::Release));
        assert_eq!(release.qos, QoS::AtLeastOnce);
        assert_eq!(release.msg_id, 4);

        // The confirmed SEND fell out lazily along the way.
        assert_eq!(fx.storage.unconfirmed(), None);
        assert_eq!(fx.storage.queue_len(), 0);
    }

    #[test]
    fn test_completed_confirms_release() {
        let fx = fixture();
        let release = encode(MsgType::Release, QoS::AtLeastOnce, false, 4, Bytes::new());
        fx.storage.save(release);

        fx.dispatcher
            .dispatch(inbound(MsgType::Completed, QoS::AtMostOnce, 4, b""));
        assert_eq!(fx.storage.unconfirmed(), None);
    }

    #[test]
    fn test_unknown_msg_type_ignored() {
        let fx = fixture();
        let mut packet = inbound(MsgType::Send, QoS::AtMostOnce, 1, b"zz");
        packet.msg_type = 0x0E;
        fx.dispatcher.dispatch(packet);

        assert!(fx.delivered.lock().is_empty());
        assert_eq!(fx.storage.queue_len(), 0);
    }
}

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

//! Reliable message-delivery client over a single duplex TCP connection.
//!
//! wirepack frames application payloads into a compact binary protocol and
//! drives the handshakes that guarantee delivery at three QoS levels:
//! at-most-once, at-least-once, and exactly-once. In-flight packets persist
//! in a pluggable [`Storage`] until the peer confirms them, retransmissions
//! back off linearly, inbound payloads reach a user callback, and the
//! connection supervisor redials automatically on transport loss.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wirepack::{ClientOptions, QoS, WirepackClient};
//!
//! # async fn run() -> wirepack::Result<()> {
//! let client = WirepackClient::new(
//!     ClientOptions::new()
//!         .address("127.0.0.1:8081")
//!         .callback(|event| match event {
//!             Ok(payload) => println!("delivered {payload:?}"),
//!             Err(err) => eprintln!("transport: {err}"),
//!         }),
//! )?;
//! client.start();
//! client.commit("hello", QoS::AtLeastOnce);
//! # Ok(())
//! # }
//! ```

pub mod callback;
pub mod client;
pub mod storage;
pub mod transport;

pub use callback::DeliveryCallback;
pub use client::{ClientOptions, WirepackClient, DEFAULT_HEARTBEAT, DEFAULT_MAX_PACKET_NUMBER};
pub use storage::{MemoryStorage, Storage};
pub use transport::{TcpConfig, TcpTransport, Transport};
pub use wirepack_protocol::{
    decode, encode, MsgType, Packet, QoS, Result, WirepackError, FIXED_HEADER_LEN,
    RETRY_INTERVAL_SECS,
};

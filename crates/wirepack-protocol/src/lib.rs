#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

pub mod codec;
pub mod error;
pub mod packet;
pub mod time;
pub mod types;

pub use codec::{decode, encode, FIXED_HEADER_LEN};
pub use error::{Result, WirepackError};
pub use packet::{Packet, RETRY_INTERVAL_SECS};
pub use types::{MsgType, QoS};

pub mod codec;
pub mod listener;
pub mod osc;

pub use codec::{decode_datagram, encode_message};
pub use osc::OscTransport;

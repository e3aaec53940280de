//! Conversion between control messages and OSC packets.
//!
//! Byte-level framing is left to `rosc`; this module only maps argument types.

use rosc::{OscMessage, OscPacket, OscType};
use tuba_core::{ControlArg, ControlMessage, TransportError};

/// Encode a control message as a single OSC datagram
pub fn encode_message(message: &ControlMessage) -> Result<Vec<u8>, TransportError> {
    let args = message
        .args
        .iter()
        .map(to_osc)
        .collect::<Result<Vec<_>, char>>()
        .map_err(|tag| TransportError::Encode {
            address: message.address.clone(),
            reason: format!("unsupported argument type '{}'", tag),
        })?;

    let packet = OscPacket::Message(OscMessage {
        addr: message.address.clone(),
        args,
    });

    rosc::encoder::encode(&packet).map_err(|e| TransportError::Encode {
        address: message.address.clone(),
        reason: format!("{:?}", e),
    })
}

/// Decode one datagram into its messages, flattening bundles in order
pub fn decode_datagram(bytes: &[u8]) -> Result<Vec<ControlMessage>, String> {
    let (_, packet) = rosc::decoder::decode_udp(bytes).map_err(|e| format!("{:?}", e))?;

    let mut messages = Vec::new();
    flatten(packet, &mut messages);
    Ok(messages)
}

fn flatten(packet: OscPacket, out: &mut Vec<ControlMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(ControlMessage::new(
            msg.addr,
            msg.args.into_iter().map(from_osc).collect(),
        )),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

/// Unsupported arguments come back as their type tag
fn to_osc(arg: &ControlArg) -> Result<OscType, char> {
    match arg {
        ControlArg::Float(v) => Ok(OscType::Float(*v)),
        ControlArg::Int(v) => Ok(OscType::Int(*v)),
        ControlArg::Double(v) => Ok(OscType::Double(*v)),
        ControlArg::Bool(v) => Ok(OscType::Bool(*v)),
        ControlArg::Str(s) => Ok(OscType::String(s.clone())),
        ControlArg::Other(tag) => Err(*tag),
    }
}

fn from_osc(arg: OscType) -> ControlArg {
    match arg {
        OscType::Float(v) => ControlArg::Float(v),
        OscType::Int(v) => ControlArg::Int(v),
        OscType::Double(v) => ControlArg::Double(v),
        OscType::Long(v) => ControlArg::Double(v as f64),
        OscType::Bool(v) => ControlArg::Bool(v),
        OscType::String(s) => ControlArg::Str(s),
        OscType::Blob(_) => ControlArg::Other('b'),
        OscType::Time(_) => ControlArg::Other('t'),
        OscType::Char(_) => ControlArg::Other('c'),
        OscType::Color(_) => ControlArg::Other('r'),
        OscType::Midi(_) => ControlArg::Other('m'),
        OscType::Array(_) => ControlArg::Other('['),
        OscType::Nil => ControlArg::Other('N'),
        OscType::Inf => ControlArg::Other('I'),
    }
}

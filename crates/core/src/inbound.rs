use crate::models::{ControlArg, ControlMessage, EQ_CHANNELS};

pub const VOLUME_PREFIX: &str = "/2/volume";
pub const GAIN_PREFIX: &str = "/2/gain";
pub const EQ_GAIN_PREFIX: &str = "/2/eqGain";
pub const EQ_ENABLE_PREFIX: &str = "/2/eqEnable";
pub const TRACK_NAME_ADDRESS: &str = "/2/trackname";

/// Pattern family of a numeric inbound message
#[derive(Clone, Debug, PartialEq)]
pub enum NumericKind {
    Volume,
    Gain,
    /// EQ band resolved to its channel name
    EqBand(&'static str),
    EqEnable,
    Unrecognized,
}

impl NumericKind {
    /// Value pattern the device uses for this family, if it is per-track
    pub fn track_pattern(&self) -> Option<&'static str> {
        match self {
            NumericKind::Volume => Some(VOLUME_PREFIX),
            NumericKind::Gain => Some(GAIN_PREFIX),
            _ => None,
        }
    }
}

/// What an inbound message means to the panel
#[derive(Clone, Debug, PartialEq)]
pub enum InboundEvent {
    Numeric {
        address: String,
        kind: NumericKind,
        value: f32,
    },
    /// Device announced the name of the selected track
    TrackName(String),
    Text { address: String, value: String },
    /// Payload the bridge cannot interpret
    Malformed { address: String, reason: String },
}

/// Classify a numeric address by prefix
pub fn classify_address(address: &str) -> NumericKind {
    if address.starts_with(VOLUME_PREFIX) {
        NumericKind::Volume
    } else if address.starts_with(GAIN_PREFIX) {
        NumericKind::Gain
    } else if let Some(band) = address.strip_prefix(EQ_GAIN_PREFIX) {
        eq_band_channel(band)
            .map(NumericKind::EqBand)
            .unwrap_or(NumericKind::Unrecognized)
    } else if address.starts_with(EQ_ENABLE_PREFIX) {
        NumericKind::EqEnable
    } else {
        NumericKind::Unrecognized
    }
}

/// Map the band suffix of `/2/eqGain<N>` to a channel (1 = Bass .. 3 = Treble)
fn eq_band_channel(suffix: &str) -> Option<&'static str> {
    let index: usize = suffix.parse().ok()?;
    index.checked_sub(1).and_then(|i| EQ_CHANNELS.get(i)).copied()
}

/// Interpret an inbound message by its first argument
pub fn classify(message: &ControlMessage) -> InboundEvent {
    let address = message.address.clone();

    match message.first_arg() {
        None => InboundEvent::Malformed {
            address,
            reason: "no arguments".to_string(),
        },
        Some(ControlArg::Str(value)) => {
            if message.address == TRACK_NAME_ADDRESS {
                InboundEvent::TrackName(value.clone())
            } else {
                InboundEvent::Text {
                    address,
                    value: value.clone(),
                }
            }
        }
        Some(arg) => match arg.as_f32() {
            Some(value) if value.is_finite() => InboundEvent::Numeric {
                kind: classify_address(&address),
                address,
                value,
            },
            Some(value) => InboundEvent::Malformed {
                address,
                reason: format!("non-finite value {}", value),
            },
            None => InboundEvent::Malformed {
                address,
                reason: format!("unexpected argument {}", arg),
            },
        },
    }
}

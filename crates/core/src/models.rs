use std::fmt;

/// Number of discrete positions on a fader (0..=SLIDER_STEPS)
pub const SLIDER_STEPS: u32 = 1000;

/// A single typed argument of a wire message
#[derive(Clone, Debug, PartialEq)]
pub enum ControlArg {
    Float(f32),
    Int(i32),
    Double(f64),
    Bool(bool),
    Str(String),
    /// An argument the bridge has no use for, kept as its OSC type tag
    Other(char),
}

impl ControlArg {
    /// Numeric view of the argument, if it has one
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ControlArg::Float(v) => Some(*v),
            ControlArg::Int(v) => Some(*v as f32),
            ControlArg::Double(v) => Some(*v as f32),
            ControlArg::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            ControlArg::Str(_) | ControlArg::Other(_) => None,
        }
    }
}

impl fmt::Display for ControlArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlArg::Float(v) => write!(f, "{}", v),
            ControlArg::Int(v) => write!(f, "{}", v),
            ControlArg::Double(v) => write!(f, "{}", v),
            ControlArg::Bool(v) => write!(f, "{}", v),
            ControlArg::Str(s) => write!(f, "'{}'", s),
            ControlArg::Other(tag) => write!(f, "<{}>", tag),
        }
    }
}

/// One unit of the wire protocol: an address pattern plus ordered arguments
#[derive(Clone, Debug, PartialEq)]
pub struct ControlMessage {
    pub address: String,
    pub args: Vec<ControlArg>,
}

impl ControlMessage {
    pub fn new(address: impl Into<String>, args: Vec<ControlArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Message carrying a single float, the shape of nearly every control message
    pub fn float(address: impl Into<String>, value: f32) -> Self {
        Self::new(address, vec![ControlArg::Float(value)])
    }

    /// Message carrying a single string
    pub fn text(address: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(address, vec![ControlArg::Str(value.into())])
    }

    pub fn first_arg(&self) -> Option<&ControlArg> {
        self.args.first()
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.address)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// Mixer bus on the remote device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bus {
    Input,
    Playback,
    Output,
}

impl Bus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bus::Input => "Input",
            Bus::Playback => "Playback",
            Bus::Output => "Output",
        }
    }

    /// Selector address for this bus on the given page, e.g. `/2/busInput`
    pub fn selector_address(&self, page: u8) -> String {
        format!("/{}/bus{}", page, self.as_str())
    }
}

/// Which panel group a channel is shown in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelGroup {
    Gain,
    Eq,
}

/// Gain faders, in display order
pub const GAIN_CHANNELS: [&str; 7] = [
    "Mic 1 Volume",
    "Mic 1 Gain",
    "Mic 2 Volume",
    "Mic 2 Gain",
    "MIDI",
    "Master",
    "Slave",
];

/// EQ band faders, in display order (band 1..=3)
pub const EQ_CHANNELS: [&str; 3] = ["Bass", "Mid", "Treble"];

/// A named fader and its normalized position
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub name: String,
    pub group: ChannelGroup,
    pub value: f32,
}

impl Channel {
    pub fn new(name: impl Into<String>, group: ChannelGroup) -> Self {
        Self {
            name: name.into(),
            group,
            value: 0.0,
        }
    }

    /// Fader position for display
    pub fn position(&self) -> u32 {
        to_position(self.value)
    }
}

/// Clamp a value into the normalized [0, 1] range
pub fn clamp_normalized(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Convert a normalized value to a slider position, rounding to the nearest step
pub fn to_position(value: f32) -> u32 {
    let position = ((clamp_normalized(value) + 0.0005) * SLIDER_STEPS as f32) as u32;
    position.min(SLIDER_STEPS)
}

/// Convert a slider position to a normalized value
pub fn from_position(position: u32) -> f32 {
    position.min(SLIDER_STEPS) as f32 / SLIDER_STEPS as f32
}

/// Parse a typed fader position (integer steps), clamping to the slider range
///
/// Returns `None` for text that is not an integer so the caller can revert
/// the field to the slider position.
pub fn parse_position(text: &str) -> Option<u32> {
    let value: i64 = text.trim().parse().ok()?;
    Some(value.clamp(0, SLIDER_STEPS as i64) as u32)
}

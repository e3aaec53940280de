use crate::models::{Bus, ControlMessage};

/// Page of the remote surface that carries per-channel controls
pub const CHANNEL_PAGE: u8 = 2;

/// How a user-editable channel reaches the device
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingEntry {
    pub channel: &'static str,
    /// Value pattern, e.g. `/2/volume`
    pub pattern: &'static str,
    /// Track name the device reports for this channel
    pub target: &'static str,
    pub bus: Bus,
}

impl MappingEntry {
    /// Message that selects this entry's bus on the device
    pub fn selector(&self) -> ControlMessage {
        ControlMessage::float(self.bus.selector_address(CHANNEL_PAGE), 1.0)
    }

    /// Message that carries the value itself
    pub fn value_message(&self, value: f32) -> ControlMessage {
        ControlMessage::float(self.pattern, value)
    }
}

const fn entry(
    channel: &'static str,
    pattern: &'static str,
    target: &'static str,
    bus: Bus,
) -> MappingEntry {
    MappingEntry {
        channel,
        pattern,
        target,
        bus,
    }
}

/// Static table from channel name to pattern, target track and bus
pub const OUTBOUND_MAPPING: [MappingEntry; 10] = [
    entry("Slave", "/2/volume", "Speaker B", Bus::Output),
    entry("Master", "/2/volume", "Main", Bus::Output),
    entry("Mic 1 Volume", "/2/volume", "Mic 1", Bus::Input),
    entry("Mic 1 Gain", "/2/gain", "Mic 1", Bus::Input),
    entry("Mic 2 Volume", "/2/volume", "Mic 2", Bus::Input),
    entry("Mic 2 Gain", "/2/gain", "Mic 2", Bus::Input),
    entry("MIDI", "/2/volume", "SPDIF", Bus::Input),
    entry("Bass", "/2/eqGain1", "Main", Bus::Output),
    entry("Mid", "/2/eqGain2", "Main", Bus::Output),
    entry("Treble", "/2/eqGain3", "Main", Bus::Output),
];

/// Look up the outbound mapping for a channel
pub fn lookup(channel: &str) -> Option<&'static MappingEntry> {
    OUTBOUND_MAPPING.iter().find(|e| e.channel == channel)
}

/// Find the channel the device means when it reports `pattern` while `target` is selected
pub fn channel_for_track(target: &str, pattern: &str) -> Option<&'static str> {
    OUTBOUND_MAPPING
        .iter()
        .find(|e| e.target == target && e.pattern == pattern)
        .map(|e| e.channel)
}

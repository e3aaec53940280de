use crate::errors::PanelError;
use crate::models::{clamp_normalized, Channel, ChannelGroup, EQ_CHANNELS, GAIN_CHANNELS};

/// Who caused a change to the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Slider drag or text entry; goes out to the device
    User,
    /// Inbound message; only refreshes the presentation
    Remote,
}

/// A stored change, emitted after the value has been clamped
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelChange {
    pub channel: String,
    pub value: f32,
    pub origin: ChangeOrigin,
}

/// Current normalized value of every channel plus the EQ enable flag
///
/// The panel is owned by the foreground context and handed to the bridge
/// explicitly; nothing else holds channel state.
#[derive(Clone, Debug)]
pub struct ControlPanel {
    channels: Vec<Channel>,
    eq_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        let channels = GAIN_CHANNELS
            .iter()
            .map(|name| Channel::new(*name, ChannelGroup::Gain))
            .chain(EQ_CHANNELS.iter().map(|name| Channel::new(*name, ChannelGroup::Eq)))
            .collect();

        Self {
            channels,
            eq_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp and store a value; last value wins
    pub fn set(
        &mut self,
        channel: &str,
        value: f32,
        origin: ChangeOrigin,
    ) -> Result<ChannelChange, PanelError> {
        if value.is_nan() {
            return Err(PanelError::NotANumber {
                channel: channel.to_string(),
            });
        }

        let slot = self
            .channels
            .iter_mut()
            .find(|c| c.name == channel)
            .ok_or_else(|| PanelError::UnknownChannel(channel.to_string()))?;

        slot.value = clamp_normalized(value);

        Ok(ChannelChange {
            channel: slot.name.clone(),
            value: slot.value,
            origin,
        })
    }

    pub fn get(&self, channel: &str) -> Option<f32> {
        self.channels.iter().find(|c| c.name == channel).map(|c| c.value)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Channels of one group, in display order
    pub fn group(&self, group: ChannelGroup) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(move |c| c.group == group)
    }

    pub fn eq_enabled(&self) -> bool {
        self.eq_enabled
    }

    pub fn set_eq_enabled(&mut self, enabled: bool) {
        self.eq_enabled = enabled;
    }
}

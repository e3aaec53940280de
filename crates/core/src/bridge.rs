//! Message bridge between the control panel and the remote mixer.
//!
//! Outbound, a user change becomes a bus selector followed (50 ms later) by the
//! value message, because the device applies values to whichever channel was
//! selected last. Inbound, messages queued by the transport's listener are
//! drained on the foreground context and applied to the [`ControlPanel`].
//! Delayed sends live in a [`TimerQueue`] owned by the bridge, so tearing the
//! bridge down or reconfiguring it cancels them.

use crate::errors::TransportError;
use crate::inbound::{classify, InboundEvent, NumericKind};
use crate::mapping::{channel_for_track, lookup};
use crate::models::{Bus, ControlMessage};
use crate::panel::{ChangeOrigin, ChannelChange, ControlPanel};
use crate::settings::ConnectionSettings;
use crate::timers::TimerQueue;
use crate::traits::MessageTransport;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, error, info, warn};

/// Gap between a bus selector and the value it prepares
pub const SELECT_TO_VALUE_DELAY: Duration = Duration::from_millis(50);
/// Delay before the bus priming requests
pub const PRIME_DELAY: Duration = Duration::from_millis(1000);
/// Delay before the first per-channel priming request
pub const CHANNEL_REQUEST_DELAY: Duration = Duration::from_millis(3000);
/// Spacing between per-channel priming requests
pub const CHANNEL_REQUEST_SPACING: Duration = Duration::from_millis(200);
/// Gap between a channel request's selector and its track step
pub const TRACK_STEP_DELAY: Duration = Duration::from_millis(100);

pub const EQ_ENABLE_ADDRESS: &str = "/2/eqEnable";
pub const TRACK_PREVIOUS_ADDRESS: &str = "/2/track-";

/// Bus selectors sent first when priming
pub const PRIME_BUS_ADDRESSES: [&str; 3] = ["/1/busPlayback", "/1/busInput", "/1/busOutput"];

/// (page, bus, track) combinations whose state is requested when priming
pub const PRIME_CHANNELS: [(u8, Bus, &str); 4] = [
    (2, Bus::Input, "Mic 1"),
    (2, Bus::Input, "SPDIF"),
    (2, Bus::Output, "Main"),
    (2, Bus::Output, "Speaker B"),
];

/// Panel state changed by an inbound message
#[derive(Clone, Debug, PartialEq)]
pub enum PanelUpdate {
    Channel(ChannelChange),
    EqEnabled(bool),
}

pub struct MessageBridge {
    transport: Box<dyn MessageTransport>,
    settings: ConnectionSettings,
    timers: TimerQueue<ControlMessage>,
    inbound: UnboundedReceiver<ControlMessage>,
    /// Track the device reported as selected, cleared whenever we move the selection
    active_track: Option<String>,
    /// Values reported before the device named its track, keyed by pattern family
    pending_values: HashMap<&'static str, f32>,
    last_text: Option<(String, String)>,
}

impl MessageBridge {
    /// Create a bridge and point the transport at the remote endpoint
    ///
    /// A remote that cannot be configured is logged, not fatal: sends are then
    /// dropped with a warning until the settings are fixed.
    pub fn new(mut transport: Box<dyn MessageTransport>, settings: ConnectionSettings) -> Self {
        match transport.set_remote(&settings.remote_host, settings.remote_port) {
            Ok(()) => info!(
                "{}: OSC client configured for {}",
                transport.name(),
                settings.remote_label()
            ),
            Err(e) => error!("{}: failed to configure OSC client: {}", transport.name(), e),
        }

        // Closed until the listener starts
        let (_, inbound) = unbounded_channel();

        Self {
            transport,
            settings,
            timers: TimerQueue::new(),
            inbound,
            active_track: None,
            pending_values: HashMap::new(),
            last_text: None,
        }
    }

    /// Schedule the priming sequence and start listening
    ///
    /// A bind failure is returned so it can be shown to the user; sending
    /// keeps working without a listener.
    pub fn start(&mut self, now: Instant) -> Result<(), TransportError> {
        self.schedule_priming(now);
        self.start_listener(self.settings.local_port)
    }

    fn start_listener(&mut self, local_port: u16) -> Result<(), TransportError> {
        // Fresh queue so nothing from a previous listener leaks through
        let (tx, rx) = unbounded_channel();
        self.inbound = rx;
        self.transport.start_receiving(local_port, tx)?;
        info!("{}: OSC server started on port {}", self.transport.name(), local_port);
        Ok(())
    }

    /// Send one message, best effort
    pub fn send(&mut self, message: &ControlMessage) -> bool {
        if moves_selection(&message.address) {
            // Reports from here on belong to whatever the device selects next
            self.active_track = None;
            self.pending_values.clear();
        }

        match self.transport.send(message) {
            Ok(()) => {
                info!("OSC SEND: {}", message);
                true
            }
            Err(TransportError::NotConfigured) => {
                warn!("OSC client not configured, dropping {}", message);
                false
            }
            Err(e) => {
                error!("Failed to send OSC message {}: {}", message, e);
                false
            }
        }
    }

    /// Mirror a user change to the device as selector-then-value
    ///
    /// Returns true if the value message was scheduled. Remote-originated
    /// changes and channels without a mapping are ignored.
    pub fn on_channel_changed(&mut self, change: &ChannelChange, now: Instant) -> bool {
        if change.origin != ChangeOrigin::User {
            return false;
        }

        let entry = match lookup(&change.channel) {
            Some(entry) => entry,
            None => {
                debug!("No outbound mapping for {}", change.channel);
                return false;
            }
        };

        if !self.send(&entry.selector()) {
            warn!(
                "Selector for {} was not sent, dropping value {}",
                change.channel, change.value
            );
            return false;
        }

        self.timers
            .schedule(now, SELECT_TO_VALUE_DELAY, entry.value_message(change.value));
        true
    }

    /// Send the EQ enable flag; no channel selection is involved
    pub fn on_eq_enable_changed(&mut self, enabled: bool) -> bool {
        let value = if enabled { 1.0 } else { 0.0 };
        self.send(&ControlMessage::float(EQ_ENABLE_ADDRESS, value))
    }

    /// Fire every delayed send that is due; returns how many were sent
    pub fn tick(&mut self, now: Instant) -> usize {
        let due = self.timers.take_due(now);
        due.iter().filter(|message| self.send(message)).count()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn schedule_priming(&mut self, now: Instant) {
        for address in PRIME_BUS_ADDRESSES {
            self.timers
                .schedule(now, PRIME_DELAY, ControlMessage::float(address, 1.0));
        }

        for (i, (page, bus, track)) in PRIME_CHANNELS.iter().enumerate() {
            let at = CHANNEL_REQUEST_DELAY + CHANNEL_REQUEST_SPACING * i as u32;
            debug!("Requesting state of {} on {} bus", track, bus.as_str());
            self.timers
                .schedule(now, at, ControlMessage::float(bus.selector_address(*page), 1.0));
            self.timers.schedule(
                now,
                at + TRACK_STEP_DELAY,
                ControlMessage::float(TRACK_PREVIOUS_ADDRESS, 1.0),
            );
        }
    }

    /// Apply every queued inbound message to the panel
    pub fn drain_inbound(&mut self, panel: &mut ControlPanel) -> Vec<PanelUpdate> {
        let mut updates = Vec::new();
        while let Ok(message) = self.inbound.try_recv() {
            updates.extend(self.handle_inbound(&message, panel));
        }
        updates
    }

    /// Route one inbound message; unknown patterns are accepted and ignored
    pub fn handle_inbound(
        &mut self,
        message: &ControlMessage,
        panel: &mut ControlPanel,
    ) -> Vec<PanelUpdate> {
        info!("OSC RECV: {}", message);

        match classify(message) {
            InboundEvent::Numeric {
                address,
                kind,
                value,
            } => self.apply_numeric(&address, kind, value, panel),
            InboundEvent::TrackName(track) => self.apply_track_name(track, panel),
            InboundEvent::Text { address, value } => {
                info!("String message: {} = {}", address, value);
                self.last_text = Some((address, value));
                Vec::new()
            }
            InboundEvent::Malformed { address, reason } => {
                warn!("Dropping malformed message on {}: {}", address, reason);
                Vec::new()
            }
        }
    }

    fn apply_numeric(
        &mut self,
        address: &str,
        kind: NumericKind,
        value: f32,
        panel: &mut ControlPanel,
    ) -> Vec<PanelUpdate> {
        match kind {
            NumericKind::EqBand(channel) => apply_remote_value(panel, channel, value).into_iter().collect(),
            NumericKind::EqEnable => {
                let enabled = value != 0.0;
                panel.set_eq_enabled(enabled);
                vec![PanelUpdate::EqEnabled(enabled)]
            }
            NumericKind::Volume | NumericKind::Gain => {
                let pattern = match kind.track_pattern() {
                    Some(pattern) => pattern,
                    None => return Vec::new(),
                };

                let track = match self.active_track.as_deref() {
                    Some(track) => track,
                    None => {
                        debug!("{} update {} cached until the track is known", pattern, value);
                        self.pending_values.insert(pattern, value);
                        return Vec::new();
                    }
                };

                match channel_for_track(track, pattern) {
                    Some(channel) => apply_remote_value(panel, channel, value).into_iter().collect(),
                    None => {
                        debug!("No channel for {} on track '{}'", pattern, track);
                        Vec::new()
                    }
                }
            }
            NumericKind::Unrecognized => {
                debug!("Ignoring unrecognized pattern {}", address);
                Vec::new()
            }
        }
    }

    fn apply_track_name(&mut self, track: String, panel: &mut ControlPanel) -> Vec<PanelUpdate> {
        info!("Device selected track '{}'", track);

        let updates: Vec<PanelUpdate> = self
            .pending_values
            .drain()
            .filter_map(|(pattern, value)| {
                channel_for_track(&track, pattern).and_then(|channel| apply_remote_value(panel, channel, value))
            })
            .collect();

        self.active_track = Some(track);
        updates
    }

    /// Point the bridge at new settings, stopping the old listener first
    ///
    /// Pending sends are cancelled only once the new settings are running.
    /// On failure the previous settings are restored, their pending sends
    /// kept, priming rescheduled for the restarted listener and the error
    /// returned.
    pub fn reconfigure(
        &mut self,
        settings: ConnectionSettings,
        now: Instant,
    ) -> Result<(), TransportError> {
        self.transport.stop_receiving()?;

        match self.apply_settings(&settings) {
            Ok(()) => {
                let cancelled = self.timers.cancel_all();
                if cancelled > 0 {
                    debug!("Cancelled {} pending sends", cancelled);
                }
                self.active_track = None;
                self.pending_values.clear();

                info!(
                    "{}: OSC services restarted, listening on {}, sending to {}",
                    self.transport.name(),
                    settings.local_port,
                    settings.remote_label()
                );
                self.settings = settings;
                self.schedule_priming(now);
                Ok(())
            }
            Err(e) => {
                error!("Reconfiguration failed, restoring previous settings: {}", e);
                let previous = self.settings.clone();
                match self.apply_settings(&previous) {
                    Ok(()) => self.schedule_priming(now),
                    Err(restore) => error!("Failed to restore previous OSC settings: {}", restore),
                }
                Err(e)
            }
        }
    }

    fn apply_settings(&mut self, settings: &ConnectionSettings) -> Result<(), TransportError> {
        self.transport
            .set_remote(&settings.remote_host, settings.remote_port)?;
        if let Err(e) = self.start_listener(settings.local_port) {
            // Keep sender and listener pointing at the same settings
            let _ = self.transport.stop_receiving();
            return Err(e);
        }
        Ok(())
    }

    /// Cancel pending sends and stop the listener
    pub fn shutdown(&mut self) {
        let cancelled = self.timers.cancel_all();
        if cancelled > 0 {
            debug!("Cancelled {} pending sends on shutdown", cancelled);
        }

        if self.transport.is_receiving() {
            match self.transport.stop_receiving() {
                Ok(()) => info!("OSC server stopped"),
                Err(e) => error!("Failed to stop OSC server: {}", e),
            }
        }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn is_listening(&self) -> bool {
        self.transport.is_receiving()
    }

    pub fn active_track(&self) -> Option<&str> {
        self.active_track.as_deref()
    }

    /// Most recent string payload, as (address, value)
    pub fn last_text(&self) -> Option<&(String, String)> {
        self.last_text.as_ref()
    }
}

impl Drop for MessageBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Messages after which the device's selected track is no longer known
fn moves_selection(address: &str) -> bool {
    address.contains("/bus") || address.starts_with("/2/track+") || address.starts_with("/2/track-")
}

fn apply_remote_value(panel: &mut ControlPanel, channel: &str, value: f32) -> Option<PanelUpdate> {
    match panel.set(channel, value, ChangeOrigin::Remote) {
        Ok(change) => Some(PanelUpdate::Channel(change)),
        Err(e) => {
            warn!("Ignoring inbound value: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ControlArg;
    use crate::traits::InboundSender;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Transport that records sends and lets tests inject inbound messages
    #[derive(Clone, Default)]
    struct RecordingTransport {
        state: Arc<Mutex<RecordingState>>,
    }

    #[derive(Default)]
    struct RecordingState {
        remote: Option<(String, u16)>,
        sent: Vec<ControlMessage>,
        listener: Option<(u16, InboundSender)>,
        busy_ports: HashSet<u16>,
        starts: Vec<u16>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<ControlMessage> {
            self.state.lock().unwrap().sent.clone()
        }

        fn clear(&self) {
            self.state.lock().unwrap().sent.clear();
        }

        fn inject(&self, message: ControlMessage) {
            let state = self.state.lock().unwrap();
            let (_, tx) = state.listener.as_ref().expect("listener running");
            tx.send(message).unwrap();
        }

        fn occupy(&self, port: u16) {
            self.state.lock().unwrap().busy_ports.insert(port);
        }
    }

    impl MessageTransport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }

        fn set_remote(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
            if host == "unresolvable" {
                return Err(TransportError::Resolve {
                    host: host.to_string(),
                    port,
                    reason: "test".to_string(),
                });
            }
            self.state.lock().unwrap().remote = Some((host.to_string(), port));
            Ok(())
        }

        fn send(&self, message: &ControlMessage) -> Result<(), TransportError> {
            let mut state = self.state.lock().unwrap();
            if state.remote.is_none() {
                return Err(TransportError::NotConfigured);
            }
            state.sent.push(message.clone());
            Ok(())
        }

        fn start_receiving(
            &mut self,
            local_port: u16,
            inbound: InboundSender,
        ) -> Result<(), TransportError> {
            let mut state = self.state.lock().unwrap();
            if state.busy_ports.contains(&local_port) || state.listener.is_some() {
                return Err(TransportError::Bind {
                    port: local_port,
                    source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
                });
            }
            state.starts.push(local_port);
            state.listener = Some((local_port, inbound));
            Ok(())
        }

        fn stop_receiving(&mut self) -> Result<(), TransportError> {
            self.state.lock().unwrap().listener = None;
            Ok(())
        }

        fn is_receiving(&self) -> bool {
            self.state.lock().unwrap().listener.is_some()
        }
    }

    fn started_bridge() -> (MessageBridge, RecordingTransport, Instant) {
        let transport = RecordingTransport::default();
        let mut bridge = MessageBridge::new(Box::new(transport.clone()), ConnectionSettings::default());
        let start = Instant::now();
        bridge.start(start).unwrap();
        (bridge, transport, start)
    }

    fn user_change(panel: &mut ControlPanel, channel: &str, value: f32) -> ChannelChange {
        panel.set(channel, value, ChangeOrigin::User).unwrap()
    }

    #[test]
    fn test_user_change_sends_selector_then_value() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        let change = user_change(&mut panel, "Mic 1 Gain", 0.5);
        assert!(bridge.on_channel_changed(&change, start));
        assert_eq!(transport.sent(), vec![ControlMessage::float("/2/busInput", 1.0)]);

        // Not yet due
        assert_eq!(bridge.tick(start + Duration::from_millis(10)), 0);

        assert_eq!(bridge.tick(start + SELECT_TO_VALUE_DELAY), 1);
        assert_eq!(
            transport.sent(),
            vec![
                ControlMessage::float("/2/busInput", 1.0),
                ControlMessage::float("/2/gain", 0.5),
            ]
        );
    }

    #[test]
    fn test_every_mapped_channel_sends_two_messages() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        for entry in crate::mapping::OUTBOUND_MAPPING.iter() {
            transport.clear();
            let change = user_change(&mut panel, entry.channel, 0.25);
            assert!(bridge.on_channel_changed(&change, start));
            bridge.tick(start + SELECT_TO_VALUE_DELAY);

            let sent = transport.sent();
            assert_eq!(sent.len(), 2, "{}", entry.channel);
            assert_eq!(sent[0], entry.selector());
            assert_eq!(sent[1], ControlMessage::float(entry.pattern, 0.25));
        }
    }

    #[test]
    fn test_out_of_range_value_is_clamped_before_sending() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        let change = user_change(&mut panel, "Treble", 3.5);
        bridge.on_channel_changed(&change, start);
        bridge.tick(start + SELECT_TO_VALUE_DELAY);

        assert_eq!(transport.sent()[1], ControlMessage::float("/2/eqGain3", 1.0));
        assert_eq!(panel.get("Treble"), Some(1.0));
    }

    #[test]
    fn test_remote_change_is_not_echoed() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        let change = panel.set("Bass", 0.3, ChangeOrigin::Remote).unwrap();
        assert!(!bridge.on_channel_changed(&change, start));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_eq_enable_is_a_single_message() {
        let (mut bridge, transport, _) = started_bridge();

        assert!(bridge.on_eq_enable_changed(true));
        assert!(bridge.on_eq_enable_changed(false));
        assert_eq!(
            transport.sent(),
            vec![
                ControlMessage::float("/2/eqEnable", 1.0),
                ControlMessage::float("/2/eqEnable", 0.0),
            ]
        );
    }

    #[test]
    fn test_send_without_remote_is_dropped() {
        let transport = RecordingTransport::default();
        let settings = ConnectionSettings::new(9001, "unresolvable", 7001);
        let mut bridge = MessageBridge::new(Box::new(transport.clone()), settings);
        let mut panel = ControlPanel::new();

        assert!(!bridge.send(&ControlMessage::float("/2/volume", 0.5)));

        // Selector fails, so no value is scheduled
        let change = user_change(&mut panel, "Master", 0.5);
        assert!(!bridge.on_channel_changed(&change, Instant::now()));
        assert_eq!(bridge.pending_timers(), 0);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_priming_sequence() {
        let (mut bridge, transport, start) = started_bridge();

        assert_eq!(bridge.tick(start + Duration::from_millis(999)), 0);
        bridge.tick(start + PRIME_DELAY);
        assert_eq!(
            transport.sent(),
            vec![
                ControlMessage::float("/1/busPlayback", 1.0),
                ControlMessage::float("/1/busInput", 1.0),
                ControlMessage::float("/1/busOutput", 1.0),
            ]
        );

        transport.clear();
        bridge.tick(start + Duration::from_secs(10));
        let addresses: Vec<_> = transport.sent().into_iter().map(|m| m.address).collect();
        assert_eq!(
            addresses,
            vec![
                "/2/busInput", "/2/track-",
                "/2/busInput", "/2/track-",
                "/2/busOutput", "/2/track-",
                "/2/busOutput", "/2/track-",
            ]
        );
        assert_eq!(bridge.pending_timers(), 0);
    }

    #[test]
    fn test_inbound_eq_band_updates_only_its_channel() {
        let (mut bridge, transport, _) = started_bridge();
        let mut panel = ControlPanel::new();

        transport.inject(ControlMessage::float("/2/eqGain1", 0.6));
        let updates = bridge.drain_inbound(&mut panel);

        assert_eq!(updates.len(), 1);
        assert_eq!(panel.get("Bass"), Some(0.6));
        for channel in panel.channels().iter().filter(|c| c.name != "Bass") {
            assert_eq!(channel.value, 0.0, "{} changed", channel.name);
        }
    }

    #[test]
    fn test_inbound_eq_enable() {
        let (mut bridge, transport, _) = started_bridge();
        let mut panel = ControlPanel::new();

        transport.inject(ControlMessage::float("/2/eqEnable", 1.0));
        assert_eq!(bridge.drain_inbound(&mut panel), vec![PanelUpdate::EqEnabled(true)]);
        assert!(panel.eq_enabled());

        transport.inject(ControlMessage::float("/2/eqEnable", 0.0));
        bridge.drain_inbound(&mut panel);
        assert!(!panel.eq_enabled());
    }

    #[test]
    fn test_inbound_unknown_and_malformed_are_ignored() {
        let (mut bridge, transport, _) = started_bridge();
        let mut panel = ControlPanel::new();
        let before = panel.channels().to_vec();

        transport.inject(ControlMessage::float("/9/unknown", 0.4));
        transport.inject(ControlMessage::new("/2/eqGain2", vec![]));
        transport.inject(ControlMessage::new("/2/eqGain2", vec![ControlArg::Other('b')]));
        transport.inject(ControlMessage::float("/2/eqGain2", 0.9));

        let updates = bridge.drain_inbound(&mut panel);
        assert_eq!(updates.len(), 1);
        assert_eq!(panel.get("Mid"), Some(0.9));
        assert_eq!(panel.channels().len(), before.len());
    }

    #[test]
    fn test_inbound_strings_go_to_text_sink() {
        let (mut bridge, transport, _) = started_bridge();
        let mut panel = ControlPanel::new();

        transport.inject(ControlMessage::text("/1/trackname1", "AN 1"));
        assert!(bridge.drain_inbound(&mut panel).is_empty());
        assert_eq!(
            bridge.last_text(),
            Some(&("/1/trackname1".to_string(), "AN 1".to_string()))
        );
    }

    #[test]
    fn test_volume_follows_reported_track() {
        let (mut bridge, transport, _) = started_bridge();
        let mut panel = ControlPanel::new();

        // Values arrive before the device names the track
        transport.inject(ControlMessage::float("/2/volume", 0.7));
        transport.inject(ControlMessage::float("/2/gain", 0.3));
        assert!(bridge.drain_inbound(&mut panel).is_empty());

        transport.inject(ControlMessage::text("/2/trackname", "Mic 1"));
        bridge.drain_inbound(&mut panel);
        assert_eq!(panel.get("Mic 1 Volume"), Some(0.7));
        assert_eq!(panel.get("Mic 1 Gain"), Some(0.3));
        assert_eq!(bridge.active_track(), Some("Mic 1"));

        // Later updates for the known track apply directly
        transport.inject(ControlMessage::float("/2/volume", 0.2));
        bridge.drain_inbound(&mut panel);
        assert_eq!(panel.get("Mic 1 Volume"), Some(0.2));
        assert_eq!(panel.get("Master"), Some(0.0));
    }

    #[test]
    fn test_selector_forgets_reported_track() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        transport.inject(ControlMessage::text("/2/trackname", "Main"));
        bridge.drain_inbound(&mut panel);
        assert_eq!(bridge.active_track(), Some("Main"));

        let change = user_change(&mut panel, "Mic 1 Volume", 0.4);
        bridge.on_channel_changed(&change, start);
        assert_eq!(bridge.active_track(), None);

        transport.inject(ControlMessage::float("/2/volume", 0.9));
        bridge.drain_inbound(&mut panel);
        assert_eq!(panel.get("Master"), Some(0.0));
    }

    #[test]
    fn test_reconfigure_cancels_timers_and_moves_listener() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        let change = user_change(&mut panel, "Master", 0.8);
        bridge.on_channel_changed(&change, start);
        assert!(bridge.pending_timers() > 1);

        let settings = ConnectionSettings::new(9100, "10.0.0.5", 7100);
        bridge.reconfigure(settings.clone(), start).unwrap();
        transport.clear();

        // The pending value for the old configuration never fires
        bridge.tick(start + SELECT_TO_VALUE_DELAY);
        assert!(transport.sent().is_empty());

        assert_eq!(bridge.settings(), &settings);
        let state = transport.state.lock().unwrap();
        assert_eq!(state.starts, vec![9001, 9100]);
        assert_eq!(state.remote, Some(("10.0.0.5".to_string(), 7100)));
    }

    #[test]
    fn test_failed_reconfigure_restores_previous_settings() {
        let (mut bridge, transport, start) = started_bridge();
        transport.occupy(9200);

        let err = bridge
            .reconfigure(ConnectionSettings::new(9200, "10.0.0.5", 7100), start)
            .unwrap_err();
        assert!(err.is_bind_failure());

        assert_eq!(bridge.settings(), &ConnectionSettings::default());
        assert!(bridge.is_listening());
        let state = transport.state.lock().unwrap();
        assert_eq!(state.listener.as_ref().map(|(port, _)| *port), Some(9001));
        assert_eq!(state.remote, Some(("127.0.0.1".to_string(), 7001)));
    }

    #[test]
    fn test_messages_from_old_listener_are_discarded() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        transport.inject(ControlMessage::float("/2/eqGain1", 0.6));
        bridge
            .reconfigure(ConnectionSettings::new(9300, "127.0.0.1", 7001), start)
            .unwrap();

        assert!(bridge.drain_inbound(&mut panel).is_empty());
        assert_eq!(panel.get("Bass"), Some(0.0));
    }

    #[test]
    fn test_pending_send_survives_failed_reconfigure() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();
        let primed = bridge.pending_timers();

        let change = user_change(&mut panel, "Master", 0.8);
        bridge.on_channel_changed(&change, start);
        transport.clear();

        transport.occupy(9200);
        bridge
            .reconfigure(ConnectionSettings::new(9200, "127.0.0.1", 7001), start)
            .unwrap_err();

        // The old endpoint is back, so the scheduled value still goes out
        assert_eq!(bridge.tick(start + SELECT_TO_VALUE_DELAY), 1);
        assert_eq!(transport.sent(), vec![ControlMessage::float("/2/volume", 0.8)]);

        // Priming is scheduled again for the restarted listener
        assert_eq!(bridge.pending_timers(), primed * 2);
    }

    #[test]
    fn test_track_change_does_not_replay_applied_values() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        transport.inject(ControlMessage::text("/2/trackname", "Main"));
        transport.inject(ControlMessage::float("/2/volume", 0.7));
        bridge.drain_inbound(&mut panel);
        assert_eq!(panel.get("Master"), Some(0.7));

        let change = user_change(&mut panel, "Mic 2 Volume", 0.1);
        bridge.on_channel_changed(&change, start);

        // Device names the new track without reporting a volume
        transport.inject(ControlMessage::text("/2/trackname", "Mic 2"));
        bridge.drain_inbound(&mut panel);

        assert_eq!(panel.get("Mic 2 Volume"), Some(0.1));
        assert_eq!(panel.get("Master"), Some(0.7));
    }

    #[test]
    fn test_selector_drops_values_cached_for_previous_selection() {
        let (mut bridge, transport, start) = started_bridge();
        let mut panel = ControlPanel::new();

        transport.inject(ControlMessage::float("/2/volume", 0.4));
        bridge.drain_inbound(&mut panel);

        let change = user_change(&mut panel, "Mic 1 Gain", 0.2);
        bridge.on_channel_changed(&change, start);

        transport.inject(ControlMessage::text("/2/trackname", "Mic 1"));
        bridge.drain_inbound(&mut panel);

        assert_eq!(panel.get("Mic 1 Volume"), Some(0.0));
        assert_eq!(panel.get("Mic 1 Gain"), Some(0.2));
    }

    #[test]
    fn test_shutdown_stops_listener_and_timers() {
        let (mut bridge, transport, _) = started_bridge();
        assert!(bridge.pending_timers() > 0);

        bridge.shutdown();
        assert_eq!(bridge.pending_timers(), 0);
        assert!(!transport.is_receiving());
    }
}

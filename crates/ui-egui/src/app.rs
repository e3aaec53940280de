use crate::views::*;
use egui::{Key, KeyboardShortcut, Modifiers};
use std::time::{Duration, Instant};
use tuba_core::{ChangeOrigin, ConnectionSettings, ControlPanel, MessageBridge, PanelUpdate};
use tuba_persistence::SettingsStore;

const SETTINGS_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::S);
const EXIT_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Q);

/// Longest the UI sleeps while inbound messages may be waiting
const IDLE_REPAINT: Duration = Duration::from_millis(50);

/// Main application state
pub struct TubaApp {
    panel: ControlPanel,
    bridge: MessageBridge,
    store: Option<SettingsStore>,

    /// UI Views
    mixer_view: MixerView,
    settings_view: Option<SettingsView>,

    status_message: Option<String>,
}

impl TubaApp {
    pub fn new(bridge: MessageBridge, store: Option<SettingsStore>) -> Self {
        Self {
            panel: ControlPanel::new(),
            bridge,
            store,
            mixer_view: MixerView::default(),
            settings_view: None,
            status_message: None,
        }
    }

    /// Show a startup problem (e.g. the listen port was taken) in the status bar
    pub fn with_status(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    fn handle_mixer_action(&mut self, action: MixerAction, now: Instant) {
        match action {
            MixerAction::ChannelMoved { channel, value } => {
                match self.panel.set(&channel, value, ChangeOrigin::User) {
                    Ok(change) => {
                        self.bridge.on_channel_changed(&change, now);
                    }
                    Err(e) => tracing::warn!("Rejected fader change: {}", e),
                }
            }
            MixerAction::EqEnableToggled(enabled) => {
                self.panel.set_eq_enabled(enabled);
                self.bridge.on_eq_enable_changed(enabled);
            }
        }
    }

    /// Reconfigure the bridge, persisting the settings only if that worked
    fn apply_settings(&mut self, settings: ConnectionSettings, now: Instant) {
        if let Err(e) = self.bridge.reconfigure(settings.clone(), now) {
            tracing::error!("Failed to apply settings: {}", e);
            if let Some(view) = &mut self.settings_view {
                view.error = Some(e.to_string());
            }
            return;
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&settings) {
                tracing::error!("Failed to save settings: {:#}", e);
                self.status_message = Some(format!("Settings applied but not saved: {}", e));
                self.settings_view = None;
                return;
            }
        }

        self.status_message = Some(format!(
            "Listening on {}, sending to {}",
            settings.local_port,
            settings.remote_label()
        ));
        self.settings_view = None;
    }

    fn open_settings(&mut self) {
        if self.settings_view.is_none() {
            self.settings_view = Some(SettingsView::new(self.bridge.settings()));
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let settings = egui::Button::new("Settings...")
                        .shortcut_text(ctx.format_shortcut(&SETTINGS_SHORTCUT));
                    if ui.add(settings).clicked() {
                        self.open_settings();
                        ui.close_menu();
                    }

                    ui.separator();

                    let exit = egui::Button::new("Exit")
                        .shortcut_text(ctx.format_shortcut(&EXIT_SHORTCUT));
                    if ui.add(exit).clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(msg) = &self.status_message {
                    ui.label(msg);
                } else if self.bridge.is_listening() {
                    ui.label(format!(
                        "Listening on {}, sending to {}",
                        self.bridge.settings().local_port,
                        self.bridge.settings().remote_label()
                    ));
                } else {
                    ui.label("⚠ Not listening");
                }

                if let Some(track) = self.bridge.active_track() {
                    ui.separator();
                    ui.label(format!("Track: {}", track));
                }

                if let Some((address, value)) = self.bridge.last_text() {
                    ui.separator();
                    ui.label(format!("{} = {}", address, value));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Settings").clicked() {
                        self.open_settings();
                    }
                });
            });
        });
    }
}

impl eframe::App for TubaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Delayed sends, then whatever the listener queued since the last frame
        self.bridge.tick(now);
        for update in self.bridge.drain_inbound(&mut self.panel) {
            if let PanelUpdate::Channel(change) = update {
                tracing::debug!("Panel updated: {} = {:.3}", change.channel, change.value);
            }
        }

        if ctx.input_mut(|i| i.consume_shortcut(&SETTINGS_SHORTCUT)) {
            self.open_settings();
        }
        if ctx.input_mut(|i| i.consume_shortcut(&EXIT_SHORTCUT)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        self.menu_bar(ctx);
        self.status_bar(ctx);

        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .show(ui, |ui| self.mixer_view.show(ui, &self.panel))
                    .inner
            })
            .inner;
        for action in actions {
            self.handle_mixer_action(action, now);
        }

        if let Some(view) = &mut self.settings_view {
            match view.show(ctx) {
                Some(SettingsAction::Save(settings)) => self.apply_settings(settings, now),
                Some(SettingsAction::Cancel) => self.settings_view = None,
                None => {}
            }
        }

        // Wake for the next delayed send or inbound poll, whichever is sooner
        let wait = self
            .bridge
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map_or(IDLE_REPAINT, |d| d.min(IDLE_REPAINT));
        ctx.request_repaint_after(wait);
    }
}

use crate::widgets::ChannelFader;
use egui::{Context, Ui};
use std::collections::HashMap;
use tuba_core::{ChannelGroup, ConnectionSettings, ControlPanel};

/// Faders for every channel, grouped, plus the EQ enable toggle
#[derive(Default)]
pub struct MixerView {
    /// Text field buffers keyed by channel name
    texts: HashMap<String, String>,
}

impl MixerView {
    pub fn show(&mut self, ui: &mut Ui, panel: &ControlPanel) -> Vec<MixerAction> {
        let mut actions = Vec::new();

        ui.group(|ui| {
            ui.heading("Gain Channels");
            self.show_group(ui, panel, ChannelGroup::Gain, &mut actions);
        });

        ui.add_space(10.0);

        ui.group(|ui| {
            ui.heading("EQ Channels");

            let mut enabled = panel.eq_enabled();
            if ui.checkbox(&mut enabled, "Enable EQ").changed() {
                actions.push(MixerAction::EqEnableToggled(enabled));
            }

            self.show_group(ui, panel, ChannelGroup::Eq, &mut actions);
        });

        actions
    }

    fn show_group(
        &mut self,
        ui: &mut Ui,
        panel: &ControlPanel,
        group: ChannelGroup,
        actions: &mut Vec<MixerAction>,
    ) {
        for channel in panel.group(group) {
            let mut value = channel.value;
            let text = self
                .texts
                .entry(channel.name.clone())
                .or_insert_with(|| channel.position().to_string());

            if ui.add(ChannelFader::new(&channel.name, &mut value, text)).changed() {
                actions.push(MixerAction::ChannelMoved {
                    channel: channel.name.clone(),
                    value,
                });
            }
        }
    }
}

pub enum MixerAction {
    ChannelMoved { channel: String, value: f32 },
    EqEnableToggled(bool),
}

/// Connection settings dialog
pub struct SettingsView {
    pub remote_host: String,
    pub remote_port: String,
    pub local_port: String,
    /// Validation or reconfiguration error shown under the fields
    pub error: Option<String>,
}

impl SettingsView {
    pub fn new(settings: &ConnectionSettings) -> Self {
        Self {
            remote_host: settings.remote_host.clone(),
            remote_port: settings.remote_port.to_string(),
            local_port: settings.local_port.to_string(),
            error: None,
        }
    }

    pub fn show(&mut self, ctx: &Context) -> Option<SettingsAction> {
        let mut action = None;

        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Grid::new("settings_grid")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Remote IP:");
                        ui.text_edit_singleline(&mut self.remote_host);
                        ui.end_row();

                        ui.label("Remote Port:");
                        ui.text_edit_singleline(&mut self.remote_port);
                        ui.end_row();

                        ui.label("Local Port:");
                        ui.text_edit_singleline(&mut self.local_port);
                        ui.end_row();
                    });

                if let Some(error) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }

                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        action = self.validate();
                    }
                    if ui.button("Cancel").clicked() {
                        action = Some(SettingsAction::Cancel);
                    }
                });
            });

        action
    }

    /// Parse the fields; on error the message is kept for display
    pub fn validate(&mut self) -> Option<SettingsAction> {
        match ConnectionSettings::from_fields(&self.remote_host, &self.remote_port, &self.local_port)
        {
            Ok(settings) => {
                self.error = None;
                Some(SettingsAction::Save(settings))
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

pub enum SettingsAction {
    Save(ConnectionSettings),
    Cancel,
}

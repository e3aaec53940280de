use anyhow::Result;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tuba_core::{ConnectionSettings, MessageBridge};
use tuba_device_osc::OscTransport;
use tuba_persistence::{with_process_env, SettingsStore};
use tuba_ui_egui::TubaApp;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tuba=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TUBA - Totalmix UBA");

    let store = match SettingsStore::open_default() {
        Ok(store) => {
            tracing::info!("Settings path: {}", store.path().display());
            Some(store)
        }
        Err(e) => {
            tracing::warn!("Settings will not be saved: {:#}", e);
            None
        }
    };

    let settings = load_settings(store.as_ref());

    let mut bridge = MessageBridge::new(Box::new(OscTransport::new("TotalMix")), settings);
    let startup_error = bridge.start(Instant::now()).err();

    let mut app = TubaApp::new(bridge, store);
    if let Some(e) = startup_error {
        tracing::error!("Failed to start OSC server: {}", e);
        app = app.with_status(format!("Not listening: {}", e));
    }

    tracing::info!("Launching UI...");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("TUBA - Totalmix UBA"),
        ..Default::default()
    };

    eframe::run_native(
        "TUBA",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}

/// Stored settings, or defaults if the file is unusable, with environment overrides
fn load_settings(store: Option<&SettingsStore>) -> ConnectionSettings {
    let stored = match store.map(SettingsStore::load) {
        Some(Ok(settings)) => settings,
        Some(Err(e)) => {
            tracing::error!("Failed to load settings, using defaults: {:#}", e);
            ConnectionSettings::default()
        }
        None => ConnectionSettings::default(),
    };

    with_process_env(stored)
}

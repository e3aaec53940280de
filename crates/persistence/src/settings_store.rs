use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tuba_core::{parse_port, ConnectionSettings};

pub const ENV_LOCAL_PORT: &str = "LOCAL_PORT";
pub const ENV_REMOTE_IP: &str = "REMOTE_IP";
pub const ENV_REMOTE_PORT: &str = "REMOTE_PORT";

const SETTINGS_FILE: &str = "settings.toml";

/// Connection settings stored as TOML on disk
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform config location, e.g. `~/.config/tuba/settings.toml`
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings, falling back to defaults when no file exists yet
    pub fn load(&self) -> Result<ConnectionSettings> {
        if !self.path.exists() {
            tracing::info!(
                "No settings at {}, using defaults",
                self.path.display()
            );
            return Ok(ConnectionSettings::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let settings: ConnectionSettings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        tracing::info!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }

    pub fn save(&self, settings: &ConnectionSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        tracing::info!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

/// Platform-specific settings path
pub fn default_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))?;
    Ok(config_dir.join("tuba").join(SETTINGS_FILE))
}

/// Apply `LOCAL_PORT`, `REMOTE_IP` and `REMOTE_PORT` from the process environment
pub fn with_process_env(settings: ConnectionSettings) -> ConnectionSettings {
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

/// Override fields from an environment lookup; invalid values are ignored
pub fn apply_env_overrides<F>(mut settings: ConnectionSettings, lookup: F) -> ConnectionSettings
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_LOCAL_PORT) {
        match parse_port("Local port", &value) {
            Ok(port) => settings.local_port = port,
            Err(e) => tracing::warn!("Ignoring {}: {}", ENV_LOCAL_PORT, e),
        }
    }

    if let Some(value) = lookup(ENV_REMOTE_IP) {
        let host = value.trim();
        if host.is_empty() {
            tracing::warn!("Ignoring empty {}", ENV_REMOTE_IP);
        } else {
            settings.remote_host = host.to_string();
        }
    }

    if let Some(value) = lookup(ENV_REMOTE_PORT) {
        match parse_port("Remote port", &value) {
            Ok(port) => settings.remote_port = port,
            Err(e) => tracing::warn!("Ignoring {}: {}", ENV_REMOTE_PORT, e),
        }
    }

    settings
}

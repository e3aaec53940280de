use crate::errors::SettingsError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCAL_PORT: u16 = 9001;
pub const DEFAULT_REMOTE_HOST: &str = "127.0.0.1";
pub const DEFAULT_REMOTE_PORT: u16 = 7001;

/// Where to listen and where to send
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_local_port")]
    pub local_port: u16,
    #[serde(default = "default_remote_host")]
    pub remote_host: String,
    #[serde(default = "default_remote_port")]
    pub remote_port: u16,
}

fn default_local_port() -> u16 {
    DEFAULT_LOCAL_PORT
}

fn default_remote_host() -> String {
    DEFAULT_REMOTE_HOST.to_string()
}

fn default_remote_port() -> u16 {
    DEFAULT_REMOTE_PORT
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            local_port: DEFAULT_LOCAL_PORT,
            remote_host: DEFAULT_REMOTE_HOST.to_string(),
            remote_port: DEFAULT_REMOTE_PORT,
        }
    }
}

impl ConnectionSettings {
    pub fn new(local_port: u16, remote_host: impl Into<String>, remote_port: u16) -> Self {
        Self {
            local_port,
            remote_host: remote_host.into(),
            remote_port,
        }
    }

    /// Build settings from the raw text of the settings dialog
    pub fn from_fields(
        remote_host: &str,
        remote_port: &str,
        local_port: &str,
    ) -> Result<Self, SettingsError> {
        let remote_host = remote_host.trim();
        if remote_host.is_empty() {
            return Err(SettingsError::EmptyHost);
        }

        Ok(Self {
            local_port: parse_port("Local port", local_port)?,
            remote_host: remote_host.to_string(),
            remote_port: parse_port("Remote port", remote_port)?,
        })
    }

    /// Remote endpoint as `host:port` for logging
    pub fn remote_label(&self) -> String {
        format!("{}:{}", self.remote_host, self.remote_port)
    }
}

/// Parse a non-zero UDP port number
pub fn parse_port(field: &'static str, value: &str) -> Result<u16, SettingsError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(SettingsError::InvalidPort {
            field,
            value: value.to_string(),
        }),
    }
}

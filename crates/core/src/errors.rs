//! Error types shared by the transport, the panel model and settings validation.

use thiserror::Error;

/// Failures of the datagram transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no outbound endpoint configured")]
    NotConfigured,

    #[error("cannot resolve remote endpoint {host}:{port}: {reason}")]
    Resolve {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("failed to bind local port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("send failed: {0}")]
    Send(#[from] std::io::Error),

    #[error("failed to encode message for {address}: {reason}")]
    Encode { address: String, reason: String },

    #[error("listener did not stop within {0} ms")]
    StopTimeout(u64),
}

impl TransportError {
    /// True if the error means the local port could not be claimed
    pub fn is_bind_failure(&self) -> bool {
        matches!(self, TransportError::Bind { .. })
    }
}

/// Failures of the control panel model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PanelError {
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("value for {channel} is not a number")]
    NotANumber { channel: String },
}

/// Invalid connection settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be a port number between 1 and 65535, got '{value}'")]
    InvalidPort { field: &'static str, value: String },

    #[error("remote host must not be empty")]
    EmptyHost,
}

use crate::codec::encode_message;
use crate::listener::Listener;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::{debug, info};
use tuba_core::{ControlMessage, InboundSender, MessageTransport, TransportError};

/// OSC over UDP to a TotalMix-style mixer
///
/// Sends go out from an ephemeral socket with each datagram addressed to the
/// remote explicitly. Receiving runs on a [`Listener`] thread.
pub struct OscTransport {
    label: String,
    remote: Option<SocketAddr>,
    sender: Option<UdpSocket>,
    listener: Option<Listener>,
}

impl OscTransport {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            remote: None,
            sender: None,
            listener: None,
        }
    }

    /// Port the listener is bound to, if running
    pub fn local_port(&self) -> Option<u16> {
        self.listener.as_ref().map(Listener::local_port)
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let resolve_err = |reason: String| TransportError::Resolve {
        host: host.to_string(),
        port,
        reason,
    };

    (host, port)
        .to_socket_addrs()
        .map_err(|e| resolve_err(e.to_string()))?
        .next()
        .ok_or_else(|| resolve_err("no addresses found".to_string()))
}

impl MessageTransport for OscTransport {
    fn name(&self) -> &str {
        &self.label
    }

    fn set_remote(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let remote = resolve(host, port)?;

        let bind_addr = if remote.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let sender = UdpSocket::bind(bind_addr).map_err(|source| TransportError::Bind {
            port: 0,
            source,
        })?;

        debug!("{}: sending to {} from {:?}", self.label, remote, sender.local_addr().ok());
        self.remote = Some(remote);
        self.sender = Some(sender);
        Ok(())
    }

    fn send(&self, message: &ControlMessage) -> Result<(), TransportError> {
        let (remote, sender) = match (self.remote, self.sender.as_ref()) {
            (Some(remote), Some(sender)) => (remote, sender),
            _ => return Err(TransportError::NotConfigured),
        };

        let bytes = encode_message(message)?;
        sender.send_to(&bytes, remote)?;
        Ok(())
    }

    fn start_receiving(
        &mut self,
        local_port: u16,
        inbound: InboundSender,
    ) -> Result<(), TransportError> {
        // Only one listener per transport
        self.stop_receiving()?;

        let listener = Listener::spawn(local_port, inbound)?;
        info!("{}: listening on port {}", self.label, listener.local_port());
        self.listener = Some(listener);
        Ok(())
    }

    fn stop_receiving(&mut self) -> Result<(), TransportError> {
        if let Some(listener) = self.listener.as_mut() {
            listener.stop()?;
        }
        self.listener = None;
        Ok(())
    }

    fn is_receiving(&self) -> bool {
        self.listener
            .as_ref()
            .map(Listener::is_running)
            .unwrap_or(false)
    }
}

use crate::errors::TransportError;
use crate::models::ControlMessage;
use tokio::sync::mpsc::UnboundedSender;

/// Sending half of the inbound queue; the listener pushes, the foreground drains
pub type InboundSender = UnboundedSender<ControlMessage>;

/// Best-effort datagram transport for control messages
///
/// There are no acknowledgements and no retries. Callers treat a failed
/// `send` as a dropped message: a stale fader value is worse than a lost one.
pub trait MessageTransport: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Point outbound messages at a remote endpoint
    fn set_remote(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    /// Transmit one message to the configured remote endpoint
    fn send(&self, message: &ControlMessage) -> Result<(), TransportError>;

    /// Bind `local_port` and forward every inbound message to `inbound`
    /// from a background context until stopped
    fn start_receiving(
        &mut self,
        local_port: u16,
        inbound: InboundSender,
    ) -> Result<(), TransportError>;

    /// Stop the listener and release its port, waiting a bounded time
    fn stop_receiving(&mut self) -> Result<(), TransportError>;

    /// Whether a listener is currently running
    fn is_receiving(&self) -> bool;
}

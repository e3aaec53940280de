use crate::codec::decode_datagram;
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use tuba_core::{InboundSender, TransportError};

/// How long a blocked read waits before re-checking the run flag
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);
/// Upper bound on waiting for the receive thread to exit
pub const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause after a receive error other than a read timeout
pub const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Largest datagram accepted; TotalMix packets are far smaller
const MAX_DATAGRAM: usize = 8192;

/// Background receiver bound to a local UDP port
///
/// Decoded messages are pushed to the inbound queue; the foreground drains it.
pub struct Listener {
    local_port: u16,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Listener {
    /// Bind `local_port` on all interfaces and start the receive thread
    pub fn spawn(local_port: u16, inbound: InboundSender) -> Result<Self, TransportError> {
        let bind_err = |source| TransportError::Bind {
            port: local_port,
            source,
        };

        let socket = UdpSocket::bind(("0.0.0.0", local_port)).map_err(bind_err)?;
        socket.set_read_timeout(Some(READ_TIMEOUT)).map_err(bind_err)?;
        // Port 0 asks the OS for a free one
        let local_port = socket.local_addr().map_err(bind_err)?.port();

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name("osc-listener".to_string())
            .spawn(move || receive_loop(socket, flag, inbound))
            .map_err(bind_err)?;

        debug!("OSC listener bound to 0.0.0.0:{}", local_port);

        Ok(Self {
            local_port,
            running,
            handle: Some(handle),
        })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the receive thread and wait a bounded time for it to release the port
    pub fn stop(&mut self) -> Result<(), TransportError> {
        self.running.store(false, Ordering::SeqCst);

        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };

        let deadline = Instant::now() + STOP_TIMEOUT;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                // Keep the handle so a later stop can try again
                self.handle = Some(handle);
                return Err(TransportError::StopTimeout(STOP_TIMEOUT.as_millis() as u64));
            }
            thread::sleep(Duration::from_millis(10));
        }

        if handle.join().is_err() {
            error!("OSC listener on port {} panicked", self.local_port);
        }
        debug!("OSC listener on port {} stopped", self.local_port);
        Ok(())
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{}", e);
        }
    }
}

fn receive_loop(socket: UdpSocket, running: Arc<AtomicBool>, inbound: InboundSender) {
    let mut buf = [0u8; MAX_DATAGRAM];

    while running.load(Ordering::SeqCst) {
        let (size, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) => {
                if let Some(pause) = error_backoff(e.kind()) {
                    warn!("OSC receive error: {}", e);
                    thread::sleep(pause);
                }
                continue;
            }
        };

        if size == 0 {
            continue;
        }

        let messages = match decode_datagram(&buf[..size]) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Dropping malformed datagram from {}: {}", from, e);
                continue;
            }
        };

        for message in messages {
            if inbound.send(message).is_err() {
                debug!("Inbound queue closed, OSC listener exiting");
                return;
            }
        }
    }
}

/// How long to wait before the next read after an error; read timeouts retry at once
fn error_backoff(kind: ErrorKind) -> Option<Duration> {
    match kind {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => None,
        _ => Some(RECEIVE_ERROR_BACKOFF),
    }
}

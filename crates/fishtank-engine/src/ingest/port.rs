use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::dispatch::PoseDispatcher;
use super::error::IngestError;

/// Well-known port the face trackers send to.
pub const DEFAULT_PORT: u16 = 11125;

#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Socket read timeout; bounds how long `stop` waits for the thread.
    pub poll_interval: Duration,
    /// Larger datagrams are truncated by the socket and fail to decode.
    pub max_packet: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            poll_interval: Duration::from_millis(100),
            max_packet: 1536,
        }
    }
}

impl IngestConfig {
    pub fn bind_addr(mut self, addr: IpAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// `0` picks an ephemeral port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn max_packet(mut self, bytes: usize) -> Self {
        self.max_packet = bytes;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// UDP listener feeding a [`PoseDispatcher`] from its own thread.
///
/// Dropping the port stops and joins the thread.
#[derive(Debug)]
pub struct PoseIngestPort {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PoseIngestPort {
    pub fn bind(config: &IngestConfig, dispatcher: PoseDispatcher) -> Result<Self, IngestError> {
        let addr = config.socket_addr();
        let bind_err = |source: io::Error| IngestError::Bind { addr: addr.to_string(), source };

        let socket = UdpSocket::bind(addr).map_err(bind_err)?;
        // A zero timeout would mean "block forever" and stop could never be observed.
        let poll = config.poll_interval.max(Duration::from_millis(1));
        socket.set_read_timeout(Some(poll)).map_err(bind_err)?;
        let local_addr = socket.local_addr().map_err(bind_err)?;

        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = Arc::clone(&stop);
            let max_packet = config.max_packet.max(16);
            thread::Builder::new()
                .name(format!("pose-ingest-{}", local_addr.port()))
                .spawn(move || listen(socket, dispatcher, stop, max_packet))
                .map_err(IngestError::Spawn)?
        };

        log::info!("pose listener bound on {local_addr}");
        Ok(Self { local_addr, stop, thread: Some(thread) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signals the listener and waits for it to exit. Idempotent.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        if thread.join().is_err() {
            log::error!("pose listener on {} panicked", self.local_addr);
        } else {
            log::debug!("pose listener on {} stopped", self.local_addr);
        }
    }
}

impl Drop for PoseIngestPort {
    fn drop(&mut self) {
        self.stop();
    }
}

fn listen(socket: UdpSocket, dispatcher: PoseDispatcher, stop: Arc<AtomicBool>, max_packet: usize) {
    let mut buf = vec![0u8; max_packet];

    while !stop.load(Ordering::Acquire) {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                // Errors are already logged and counted by the dispatcher.
                let _ = dispatcher.handle_packet(&buf[..len], Some(from));
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                // ICMP port-unreachable and similar surface here on some platforms.
                log::warn!("pose listener receive failed: {e}");
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::EyePositionAggregator;

    fn loopback() -> IngestConfig {
        IngestConfig::default()
            .bind_addr(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .port(0)
            .poll_interval(Duration::from_millis(20))
    }

    #[test]
    fn defaults_match_tracker_firmware() {
        let config = IngestConfig::default();
        assert_eq!(config.port, 11125);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:11125");
    }

    #[test]
    fn binds_ephemeral_port_and_stops() {
        let dispatcher = PoseDispatcher::new(Arc::new(EyePositionAggregator::new()));
        let mut port = PoseIngestPort::bind(&loopback(), dispatcher).unwrap();
        assert_ne!(port.local_addr().port(), 0);
        assert!(port.is_running());

        port.stop();
        assert!(!port.is_running());
        port.stop();
    }

    #[test]
    fn second_bind_on_same_port_fails() {
        let dispatcher = PoseDispatcher::new(Arc::new(EyePositionAggregator::new()));
        let first = PoseIngestPort::bind(&loopback(), dispatcher.clone()).unwrap();

        let taken = loopback().port(first.local_addr().port());
        let err = PoseIngestPort::bind(&taken, dispatcher).unwrap_err();
        assert!(matches!(err, IngestError::Bind { .. }));
        assert!(!err.is_per_message());
    }
}

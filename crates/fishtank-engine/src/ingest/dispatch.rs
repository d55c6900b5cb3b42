use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::tracking::EyePositionAggregator;

use super::error::IngestError;
use super::event::{PoseAddress, PoseEvent};
use super::osc::{OscMessage, OscPacket};

/// Counters shared between the listener thread and observers.
#[derive(Debug, Default)]
pub struct IngestStats {
    packets: AtomicU64,
    applied: AtomicU64,
    dropped: AtomicU64,
}

impl IngestStats {
    /// Datagrams fully handled. A reader that sees the count also sees
    /// every update those datagrams applied.
    pub fn packets_received(&self) -> u64 {
        self.packets.load(Ordering::Acquire)
    }

    pub fn events_applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Messages or packets discarded as unknown, malformed or unsupported.
    pub fn events_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Routes decoded pose messages onto the aggregator.
///
/// Cheap to clone; clones share the aggregator and counters.
#[derive(Debug, Clone)]
pub struct PoseDispatcher {
    aggregator: Arc<EyePositionAggregator>,
    stats: Arc<IngestStats>,
}

impl PoseDispatcher {
    pub fn new(aggregator: Arc<EyePositionAggregator>) -> Self {
        Self { aggregator, stats: Arc::new(IngestStats::default()) }
    }

    pub fn aggregator(&self) -> &Arc<EyePositionAggregator> {
        &self.aggregator
    }

    pub fn stats(&self) -> &Arc<IngestStats> {
        &self.stats
    }

    /// Decodes one datagram and dispatches every message in it.
    ///
    /// Per-message failures are logged and counted, never returned; only an
    /// undecodable datagram is an error. Returns the number of events applied.
    pub fn handle_packet(&self, data: &[u8], from: Option<SocketAddr>) -> Result<usize, IngestError> {
        let packet = match OscPacket::decode(data) {
            Ok(packet) => packet,
            Err(source) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                self.stats.packets.fetch_add(1, Ordering::Release);
                let err = IngestError::Osc { from, source };
                log::warn!("{err}");
                return Err(err);
            }
        };

        let mut applied = 0;
        for msg in packet.into_messages() {
            match self.dispatch(&msg) {
                Ok(()) => applied += 1,
                Err(err) => log::warn!("dropped `{}`: {err}", msg.address),
            }
        }
        self.stats.packets.fetch_add(1, Ordering::Release);
        Ok(applied)
    }

    /// Applies one message. The device is looked up before the method is
    /// interpreted, so an unknown device wins over an unknown method.
    pub fn dispatch(&self, msg: &OscMessage) -> Result<(), IngestError> {
        let result = PoseAddress::parse(&msg.address).and_then(|addr| {
            // Decoded outside the lock; the method error only surfaces once
            // the device is known to exist.
            let event = PoseEvent::from_method(addr.method, &msg.args);
            let lost = self
                .aggregator
                .update(addr.device_id, |source| event.map(|event| event.apply(source)))
                .map_err(IngestError::from)??;
            log_transition(addr.device_id, lost);
            Ok(())
        });
        self.count(&result);
        result
    }

    /// Applies an already decoded event, as a local tracker would.
    pub fn apply(&self, device_id: &str, event: PoseEvent) -> Result<(), IngestError> {
        let result = self
            .aggregator
            .update(device_id, |source| event.apply(source))
            .map(|lost| log_transition(device_id, lost))
            .map_err(IngestError::from);
        self.count(&result);
        result
    }

    fn count(&self, result: &Result<(), IngestError>) {
        let counter = if result.is_ok() { &self.stats.applied } else { &self.stats.dropped };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

fn log_transition(device_id: &str, lost: bool) {
    if lost {
        log::debug!("tracking source `{device_id}` lost");
    }
}

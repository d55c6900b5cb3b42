use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use crate::coords::Transform;
use crate::ingest::{IngestStats, PoseDispatcher, PoseIngestPort};
use crate::projection::{ContextId, ProjectorRegistry, SharedProjector};
use crate::tracking::{EyePositionAggregator, FusedEye};

use super::config::VirtualWindowConfig;

/// Outcome of one frame update.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FrameUpdate {
    /// No source is tracked; the projector kept its previous pose.
    Retained,
    /// The projector now looks from the fused eye position.
    Updated(FusedEye),
}

/// One running virtual window: tracking sources, the pose listener and the
/// projector of one rendering context.
pub struct VirtualWindowSession {
    context: ContextId,
    window_transform: Transform,
    enabled: bool,
    aggregator: Arc<EyePositionAggregator>,
    dispatcher: PoseDispatcher,
    projector: Option<SharedProjector>,
    port: Option<PoseIngestPort>,
}

impl VirtualWindowSession {
    pub fn start(
        config: VirtualWindowConfig,
        registry: &ProjectorRegistry,
        context: ContextId,
    ) -> anyhow::Result<Self> {
        config.validate().context("invalid virtual window configuration")?;

        let aggregator = Arc::new(EyePositionAggregator::with_staleness(config.stale_after));
        for source in &config.sources {
            aggregator
                .register(source.clone())
                .with_context(|| format!("failed to register tracking device `{}`", source.device_id))?;
        }

        let projector = registry.projector_for(context);
        {
            let (width, height) = config.virtual_size();
            let mut p = projector.write();
            p.set_window_geometry(config.window_transform.translation, width, height);
            p.set_top_edge(config.top_edge);
        }

        let dispatcher = PoseDispatcher::new(Arc::clone(&aggregator));
        let port = PoseIngestPort::bind(&config.ingest, dispatcher.clone()).inspect_err(|e| {
            log::error!("{e}; virtual window session not started");
        })?;

        log::info!(
            "virtual window session started for context {} ({} sources, listening on {})",
            context.0,
            aggregator.len(),
            port.local_addr()
        );

        Ok(Self {
            context,
            window_transform: config.window_transform,
            enabled: config.enabled,
            aggregator,
            dispatcher,
            projector: Some(projector),
            port: Some(port),
        })
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn aggregator(&self) -> &Arc<EyePositionAggregator> {
        &self.aggregator
    }

    /// `None` once the session has stopped.
    pub fn projector(&self) -> Option<&SharedProjector> {
        self.projector.as_ref()
    }

    /// Entry point for pose events that do not arrive over the network.
    pub fn dispatcher(&self) -> &PoseDispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> &Arc<IngestStats> {
        self.dispatcher.stats()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.port.as_ref().map(PoseIngestPort::local_addr)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Takes effect on the next frame that has a tracked eye.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Pushes the fused eye pose into the projector. Call once per frame,
    /// before the host asks for its view.
    pub fn update_frame(&self) -> FrameUpdate {
        let Some(projector) = &self.projector else {
            return FrameUpdate::Retained;
        };
        let Some(fused) = self.aggregator.fuse() else {
            return FrameUpdate::Retained;
        };

        let mut p = projector.write();
        p.set_view_transform(Transform::new(self.window_transform.rotation, fused.position));
        p.set_enabled(self.enabled);
        FrameUpdate::Updated(fused)
    }

    /// Stops the listener and releases the projector. Idempotent.
    pub fn stop(&mut self) {
        let Some(mut port) = self.port.take() else {
            return;
        };
        port.stop();
        self.projector = None;
        log::info!("virtual window session for context {} stopped", self.context.0);
    }
}

impl Drop for VirtualWindowSession {
    fn drop(&mut self) {
        self.stop();
    }
}

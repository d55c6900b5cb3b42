use std::time::Duration;

use anyhow::ensure;
use glam::Vec3;

use crate::coords::Transform;
use crate::ingest::IngestConfig;
use crate::projection::TopEdge;
use crate::tracking::SourceConfig;

/// Everything a virtual window session needs to start.
///
/// Lengths are centimetres; `window_width`/`window_height` are the physical
/// size of the screen and are divided by `real_virtual_rate` before use.
#[derive(Debug, Clone)]
pub struct VirtualWindowConfig {
    pub enabled: bool,
    pub window_width: f32,
    pub window_height: f32,
    pub real_virtual_rate: f32,
    /// World pose of the window's bottom-centre.
    pub window_transform: Transform,
    pub top_edge: TopEdge,
    pub stale_after: Option<Duration>,
    pub ingest: IngestConfig,
    pub sources: Vec<SourceConfig>,
}

impl Default for VirtualWindowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_width: 68.5,
            window_height: 38.58,
            real_virtual_rate: 1.0,
            window_transform: Transform::from_translation(Vec3::new(100.0, 0.0, 0.0)),
            top_edge: TopEdge::default(),
            stale_after: None,
            ingest: IngestConfig::default(),
            sources: Vec::new(),
        }
    }
}

impl VirtualWindowConfig {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn window_size(mut self, width: f32, height: f32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn real_virtual_rate(mut self, rate: f32) -> Self {
        self.real_virtual_rate = rate;
        self
    }

    pub fn window_transform(mut self, transform: Transform) -> Self {
        self.window_transform = transform;
        self
    }

    pub fn top_edge(mut self, top_edge: TopEdge) -> Self {
        self.top_edge = top_edge;
        self
    }

    pub fn stale_after(mut self, stale_after: Option<Duration>) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    pub fn source(mut self, source: SourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    /// Window size in world units.
    pub fn virtual_size(&self) -> (f32, f32) {
        (
            self.window_width / self.real_virtual_rate,
            self.window_height / self.real_virtual_rate,
        )
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.window_width.is_finite() && self.window_width > 0.0,
            "window width must be positive, got {}",
            self.window_width
        );
        ensure!(
            self.window_height.is_finite() && self.window_height > 0.0,
            "window height must be positive, got {}",
            self.window_height
        );
        ensure!(
            self.real_virtual_rate.is_finite() && self.real_virtual_rate > 0.0,
            "real/virtual rate must be positive, got {}",
            self.real_virtual_rate
        );
        ensure!(self.window_transform.is_finite(), "window transform is not finite");
        for source in &self.sources {
            ensure!(
                source.location.is_finite() && source.yaw.is_finite(),
                "placement of tracking device `{}` is not finite",
                source.device_id
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_small_monitor() {
        let config = VirtualWindowConfig::default();
        assert!(config.enabled);
        assert_eq!(config.virtual_size(), (68.5, 38.58));
        assert_eq!(config.window_transform.translation, Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(config.stale_after, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rate_scales_virtual_size() {
        let config = VirtualWindowConfig::default().window_size(100.0, 50.0).real_virtual_rate(2.0);
        assert_eq!(config.virtual_size(), (50.0, 25.0));
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(VirtualWindowConfig::default().window_size(0.0, 10.0).validate().is_err());
        assert!(VirtualWindowConfig::default().window_size(10.0, -1.0).validate().is_err());
        assert!(VirtualWindowConfig::default().real_virtual_rate(0.0).validate().is_err());
        assert!(VirtualWindowConfig::default().real_virtual_rate(f32::NAN).validate().is_err());
    }

    #[test]
    fn rejects_non_finite_source_placement() {
        let config = VirtualWindowConfig::default()
            .source(SourceConfig::new("1").location(Vec3::new(f32::INFINITY, 0.0, 0.0)));
        assert!(config.validate().is_err());
    }
}

use std::mem;

use glam::{Mat4, Vec3};

use crate::coords::Transform;

use super::error::ProjectionError;
use super::frustum::{aspect_ratio, near_plane, FrustumEdges, TopEdge};
use super::hooks::{ViewExtension, ViewPoint};

/// World placement and physical size of the window.
///
/// `position` is the bottom-centre of the window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindowPlane {
    pub position: Vec3,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowPlane {
    fn default() -> Self {
        Self {
            position: Vec3::new(100.0, 0.0, 0.0),
            width: 100.0,
            height: 100.0,
        }
    }
}

/// Turns the fused eye pose and the window geometry into view overrides.
///
/// The override starts disabled; until enabled both hooks leave the host's
/// camera and projection alone.
#[derive(Debug, Default)]
pub struct WindowFrustumProjector {
    window: WindowPlane,
    view_transform: Transform,
    enabled: bool,
    top_edge: TopEdge,
    last_good: Option<Mat4>,
    last_error: Option<ProjectionError>,
}

impl WindowFrustumProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_window_geometry(&mut self, position: Vec3, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0) {
            log::warn!("window geometry {width}x{height} has no area; projection updates will be skipped");
        }
        self.window = WindowPlane { position, width, height };
        // The cached matrix belongs to the old geometry.
        self.last_good = None;
    }

    pub fn window(&self) -> WindowPlane {
        self.window
    }

    /// Fused viewer pose for the current frame.
    pub fn set_view_transform(&mut self, transform: Transform) {
        self.view_transform = transform;
    }

    pub fn view_transform(&self) -> Transform {
        self.view_transform
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::debug!("virtual window override {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_top_edge(&mut self, top_edge: TopEdge) {
        if self.top_edge != top_edge {
            self.last_good = None;
        }
        self.top_edge = top_edge;
    }

    pub fn top_edge(&self) -> TopEdge {
        self.top_edge
    }

    /// Camera pose the host should use, or `None` while disabled.
    pub fn compute_view_override(&self) -> Option<ViewPoint> {
        self.enabled.then(|| ViewPoint::from_transform(&self.view_transform))
    }

    /// Window position relative to the current view, with world axis labels
    /// (`x` depth, `y` right, `z` up).
    pub fn window_in_view_space(&self) -> Vec3 {
        self.view_transform.inverse_transform_point(self.window.position)
    }

    /// Frustum edges for `input`'s near plane and aspect.
    pub fn frustum_edges(&self, input: &Mat4) -> Result<FrustumEdges, ProjectionError> {
        let aspect = aspect_ratio(input).ok_or(ProjectionError::UnsupportedHostProjection)?;
        let near = near_plane(input).ok_or(ProjectionError::UnsupportedHostProjection)?;

        FrustumEdges::through_window(
            self.window_in_view_space(),
            self.window.width,
            self.window.height,
            aspect,
            near,
            self.top_edge,
        )
    }

    /// Replacement for the host projection `input`.
    ///
    /// `None` while disabled. When the current pose is degenerate the last good
    /// override is returned instead (or `None` if there is none yet).
    pub fn compute_projection_override(&mut self, input: &Mat4) -> Option<Mat4> {
        if !self.enabled {
            return None;
        }

        let result = self.frustum_edges(input).and_then(|edges| {
            let m = edges.projection();
            if m.is_finite() { Ok(m) } else { Err(ProjectionError::NonFinite) }
        });

        match result {
            Ok(m) => {
                if self.last_error.take().is_some() {
                    log::debug!("virtual window projection resumed");
                }
                self.last_good = Some(m);
                Some(m)
            }
            Err(err) => {
                let same_kind = self
                    .last_error
                    .is_some_and(|prev| mem::discriminant(&prev) == mem::discriminant(&err));
                if !same_kind {
                    log::debug!("virtual window projection skipped: {err}");
                }
                self.last_error = Some(err);
                self.last_good
            }
        }
    }
}

impl ViewExtension for WindowFrustumProjector {
    fn setup_view_point(&self, view: &mut ViewPoint) {
        if let Some(over) = self.compute_view_override() {
            *view = over;
        }
    }

    fn setup_projection_matrix(&mut self, projection: &mut Mat4) {
        if let Some(over) = self.compute_projection_override(projection) {
            *projection = over;
        }
    }
}

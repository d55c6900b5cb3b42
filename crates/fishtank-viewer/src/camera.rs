use glam::{Mat4, Quat, Vec3};

use fishtank_engine::projection::{ViewExtension, ViewPoint, WindowPlane};

/// Where the eye sits in front of the window when nothing overrides it.
const DEFAULT_EYE_DISTANCE: f32 = 60.0;

/// The camera the host would use without a virtual window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HostCamera {
    pub location: Vec3,
    pub rotation: Quat,
    pub fov_y_degrees: f32,
    pub near: f32,
}

impl HostCamera {
    /// Looking straight through the centre of `window`.
    pub fn facing(window: &WindowPlane) -> Self {
        Self {
            location: window.position + Vec3::new(-DEFAULT_EYE_DISTANCE, 0.0, window.height / 2.0),
            rotation: Quat::IDENTITY,
            fov_y_degrees: 60.0,
            near: 10.0,
        }
    }

    pub fn view_point(&self) -> ViewPoint {
        ViewPoint::new(self.location, self.rotation)
    }

    /// Infinite reversed-Z perspective; `aspect` is width over height.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_infinite_reverse_lh(self.fov_y_degrees.to_radians(), aspect, self.near)
    }

    /// Default camera after `ext` had its say.
    pub fn view_projection(&self, aspect: f32, ext: &mut impl ViewExtension) -> Mat4 {
        let mut view = self.view_point();
        let mut projection = self.projection(aspect);
        ext.setup_view_point(&mut view);
        ext.setup_projection_matrix(&mut projection);
        projection * view.view_matrix()
    }
}

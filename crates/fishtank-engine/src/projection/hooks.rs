use glam::{Mat4, Quat, Vec3, Vec4};

use crate::coords::Transform;

/// Camera pose handed between the host pipeline and view extensions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewPoint {
    pub location: Vec3,
    pub rotation: Quat,
}

impl ViewPoint {
    pub fn new(location: Vec3, rotation: Quat) -> Self {
        Self { location, rotation }
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }

    /// World-to-view matrix for the host's view space (+x right, +y up, +z forward).
    pub fn view_matrix(&self) -> Mat4 {
        // World axes are (forward, right, up); view axes are (right, up, forward).
        let swizzle = Mat4::from_cols(
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::W,
        );
        let inverse_pose =
            Mat4::from_quat(self.rotation.inverse()) * Mat4::from_translation(-self.location);
        swizzle * inverse_pose
    }
}

/// Per-frame hooks a host pipeline calls while building its view.
///
/// Implementations leave the arguments untouched when they have nothing to
/// contribute, so a host can call them unconditionally.
pub trait ViewExtension {
    /// May replace the camera pose.
    fn setup_view_point(&self, view: &mut ViewPoint);

    /// May replace the projection matrix. `projection` holds the host default on entry.
    fn setup_projection_matrix(&mut self, projection: &mut Mat4);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rotator;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_view_maps_world_forward_to_depth() {
        let vp = ViewPoint::new(Vec3::ZERO, Quat::IDENTITY);
        let m = vp.view_matrix();
        assert_abs_diff_eq!(m.transform_point3(Vec3::new(7.0, 0.0, 0.0)), Vec3::new(0.0, 0.0, 7.0));
        assert_abs_diff_eq!(m.transform_point3(Vec3::new(0.0, 2.0, 0.0)), Vec3::new(2.0, 0.0, 0.0));
        assert_abs_diff_eq!(m.transform_point3(Vec3::new(0.0, 0.0, 3.0)), Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn view_matrix_is_relative_to_pose() {
        let pose = Transform::from_rotator(Rotator::from_yaw(90.0), Vec3::new(10.0, 0.0, 5.0));
        let vp = ViewPoint::from_transform(&pose);
        // One unit along the pose's forward axis is one unit of depth.
        let p = pose.transform_point(Vec3::X);
        assert_abs_diff_eq!(vp.view_matrix().transform_point3(p), Vec3::Z, epsilon = 1e-5);
    }
}

use glam::{Mat4, Vec3, Vec4};

use super::error::ProjectionError;

/// Smallest eye-to-window depth accepted, in world units.
pub const MIN_WINDOW_DEPTH: f32 = 1.0e-3;

/// How the top frustum edge is derived.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum TopEdge {
    /// `bottom + aspect * width`: the window height implied by the host viewport's
    /// aspect, which keeps pixels square when display and window aspects differ.
    #[default]
    ViewportAspect,

    /// `bottom + height`: the physical window height.
    WindowHeight,
}

/// Near-plane rectangle of an off-centre frustum.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrustumEdges {
    pub near: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl FrustumEdges {
    /// Frustum through a window whose bottom-centre sits at `window_vs`.
    ///
    /// `window_vs` is in the eye's frame with world axis labels: `x` is depth,
    /// `y` is right, `z` is up.
    pub fn through_window(
        window_vs: Vec3,
        width: f32,
        height: f32,
        aspect: f32,
        near: f32,
        top_edge: TopEdge,
    ) -> Result<Self, ProjectionError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(ProjectionError::DegenerateWindow);
        }
        if !(window_vs.x > MIN_WINDOW_DEPTH) {
            return Err(ProjectionError::EyeOnWindowPlane { depth: window_vs.x });
        }

        let scale = near / window_vs.x;
        let extent = match top_edge {
            TopEdge::ViewportAspect => aspect * width,
            TopEdge::WindowHeight => height,
        };

        let edges = Self {
            near,
            left: scale * (window_vs.y - width / 2.0),
            right: scale * (window_vs.y + width / 2.0),
            bottom: scale * window_vs.z,
            top: scale * (window_vs.z + extent),
        };

        if !edges.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        if edges.right <= edges.left || edges.top <= edges.bottom {
            return Err(ProjectionError::DegenerateWindow);
        }
        Ok(edges)
    }

    /// Off-centre projection with reversed Z and an infinite far plane.
    pub fn projection(&self) -> Mat4 {
        let Self { near, left, right, bottom, top } = *self;
        let width = right - left;
        let height = top - bottom;

        Mat4::from_cols(
            Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
            Vec4::new(-(right + left) / width, -(top + bottom) / height, 0.0, 1.0),
            Vec4::new(0.0, 0.0, near, 0.0),
        )
    }

    fn is_finite(&self) -> bool {
        self.near.is_finite()
            && self.left.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
            && self.top.is_finite()
    }
}

/// Near-plane distance encoded in a host projection.
///
/// Infinite reversed-Z (`z_clip = near`) and finite forward-Z
/// (`z_clip = a*z + b`, zero at the near plane) are understood.
pub fn near_plane(projection: &Mat4) -> Option<f32> {
    let a = projection.z_axis.z;
    let b = projection.w_axis.z;
    let near = if a == 0.0 { b } else { -b / a };
    (near.is_finite() && near > 0.0).then_some(near)
}

/// `P[0][0] / P[1][1]`, i.e. viewport height over width for a symmetric host projection.
pub fn aspect_ratio(projection: &Mat4) -> Option<f32> {
    let ratio = projection.x_axis.x / projection.y_axis.y;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const W: f32 = 68.5;
    const H: f32 = 38.58;

    // ── host decoding ─────────────────────────────────────────────────────

    #[test]
    fn reads_near_from_infinite_reversed_projection() {
        let p = Mat4::perspective_infinite_reverse_lh(60f32.to_radians(), 16.0 / 9.0, 10.0);
        assert_relative_eq!(near_plane(&p).unwrap(), 10.0);
    }

    #[test]
    fn reads_near_from_finite_projection() {
        let p = Mat4::perspective_lh(60f32.to_radians(), 1.5, 2.5, 1000.0);
        assert_relative_eq!(near_plane(&p).unwrap(), 2.5, max_relative = 1e-5);
    }

    #[test]
    fn aspect_is_height_over_width() {
        let p = Mat4::perspective_infinite_reverse_lh(60f32.to_radians(), 16.0 / 9.0, 10.0);
        assert_relative_eq!(aspect_ratio(&p).unwrap(), 9.0 / 16.0, max_relative = 1e-5);
    }

    #[test]
    fn non_perspective_matrix_is_rejected() {
        assert_eq!(near_plane(&Mat4::ZERO), None);
        assert_eq!(aspect_ratio(&Mat4::ZERO), None);
    }

    // ── edges ─────────────────────────────────────────────────────────────

    #[test]
    fn centred_eye_gives_symmetric_left_right() {
        let e = FrustumEdges::through_window(Vec3::new(100.0, 0.0, 0.0), W, H, 0.5, 10.0, TopEdge::default())
            .unwrap();
        assert_abs_diff_eq!(e.left.abs(), e.right.abs(), epsilon = 1e-6);
        assert_abs_diff_eq!(e.right, 10.0 / 100.0 * W / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn edges_follow_reference_formula() {
        let vs = Vec3::new(80.0, 12.0, -20.0);
        let (near, aspect) = (10.0, 9.0 / 16.0);
        let e = FrustumEdges::through_window(vs, W, H, aspect, near, TopEdge::ViewportAspect).unwrap();
        let scale = near / vs.x;
        assert_relative_eq!(e.left, scale * (vs.y - W / 2.0));
        assert_relative_eq!(e.right, scale * (vs.y + W / 2.0));
        assert_relative_eq!(e.bottom, scale * vs.z);
        assert_relative_eq!(e.top, scale * (vs.z + aspect * W));
    }

    #[test]
    fn window_height_policy_uses_physical_height() {
        let vs = Vec3::new(80.0, 0.0, -20.0);
        let e = FrustumEdges::through_window(vs, W, H, 9.0 / 16.0, 10.0, TopEdge::WindowHeight).unwrap();
        assert_relative_eq!(e.top - e.bottom, 10.0 / 80.0 * H);
    }

    #[test]
    fn eye_on_window_plane_is_rejected() {
        let err = FrustumEdges::through_window(Vec3::new(0.0, 0.0, 0.0), W, H, 0.5, 10.0, TopEdge::default())
            .unwrap_err();
        assert_eq!(err, ProjectionError::EyeOnWindowPlane { depth: 0.0 });
    }

    #[test]
    fn eye_past_window_plane_is_rejected() {
        let r = FrustumEdges::through_window(Vec3::new(-30.0, 0.0, 0.0), W, H, 0.5, 10.0, TopEdge::default());
        assert!(matches!(r, Err(ProjectionError::EyeOnWindowPlane { .. })));
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        let r = FrustumEdges::through_window(Vec3::X * 50.0, 0.0, H, 0.5, 10.0, TopEdge::default());
        assert_eq!(r, Err(ProjectionError::DegenerateWindow));
    }

    #[test]
    fn nan_position_is_rejected() {
        let r = FrustumEdges::through_window(Vec3::new(50.0, f32::NAN, 0.0), W, H, 0.5, 10.0, TopEdge::default());
        assert_eq!(r, Err(ProjectionError::NonFinite));
    }

    // ── matrix ────────────────────────────────────────────────────────────

    #[test]
    fn symmetric_edges_match_host_perspective() {
        let near = 10.0;
        let fov_y = 60f32.to_radians();
        let aspect = 1.6;
        let top = near * (fov_y / 2.0).tan();
        let right = top * aspect;
        let edges = FrustumEdges { near, left: -right, right, bottom: -top, top };

        let host = Mat4::perspective_infinite_reverse_lh(fov_y, aspect, near);
        assert_abs_diff_eq!(edges.projection(), host, epsilon = 1e-5);
    }

    #[test]
    fn window_corners_land_on_clip_edges() {
        let vs = Vec3::new(60.0, 15.0, -10.0);
        let e = FrustumEdges::through_window(vs, W, H, 0.0, 5.0, TopEdge::WindowHeight).unwrap();
        let p = e.projection();

        // View space for the host is (right, up, depth).
        let bottom_left = Vec4::new(vs.y - W / 2.0, vs.z, vs.x, 1.0);
        let top_right = Vec4::new(vs.y + W / 2.0, vs.z + H, vs.x, 1.0);

        let bl = p * bottom_left;
        let tr = p * top_right;
        assert_abs_diff_eq!(bl.x / bl.w, -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(bl.y / bl.w, -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(tr.x / tr.w, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(tr.y / tr.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn depth_is_reversed_with_near_at_one() {
        let e = FrustumEdges { near: 5.0, left: -1.0, right: 1.0, bottom: -1.0, top: 1.0 };
        let p = e.projection();
        let at_near = p * Vec4::new(0.0, 0.0, 5.0, 1.0);
        let far = p * Vec4::new(0.0, 0.0, 5.0e4, 1.0);
        assert_abs_diff_eq!(at_near.z / at_near.w, 1.0, epsilon = 1e-6);
        assert!(far.z / far.w < 1e-3);
        assert_eq!(near_plane(&p), Some(5.0));
    }
}

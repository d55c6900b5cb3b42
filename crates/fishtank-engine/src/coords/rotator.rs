use glam::Quat;

/// Euler rotation in degrees.
///
/// Applied roll first, then pitch, then yaw:
/// - yaw turns +X toward +Y about +Z
/// - pitch raises +X toward +Z
/// - roll dips +Y toward -Z about +X
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator { pitch: 0.0, yaw: 0.0, roll: 0.0 };

    #[inline]
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    #[inline]
    pub const fn from_yaw(yaw: f32) -> Self {
        Self { pitch: 0.0, yaw, roll: 0.0 }
    }

    /// Equivalent unit quaternion.
    pub fn to_quat(self) -> Quat {
        // glam rotations are right-handed about each axis, so pitch and roll flip sign.
        Quat::from_rotation_z(self.yaw.to_radians())
            * Quat::from_rotation_y(-self.pitch.to_radians())
            * Quat::from_rotation_x(-self.roll.to_radians())
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

use std::borrow::Borrow;
use std::fmt;
use std::time::Instant;

use glam::Vec3;

use crate::coords::{Rotator, Transform};

/// Opaque tracker identifier, as carried in the ingest address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Registration parameters for one tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub device_id: DeviceId,

    /// Where the tracking device sits in the world.
    pub location: Vec3,

    /// World heading of the device in degrees. Gravity samples cannot observe it.
    pub yaw: f32,
}

impl SourceConfig {
    pub fn new(device_id: impl Into<DeviceId>) -> Self {
        Self {
            device_id: device_id.into(),
            location: Vec3::ZERO,
            yaw: 0.0,
        }
    }

    pub fn location(mut self, location: Vec3) -> Self {
        self.location = location;
        self
    }

    pub fn yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }
}

/// Last known state of one tracking device.
///
/// Plain data; synchronization is the aggregator's job.
#[derive(Debug, Clone)]
pub struct TrackedSource {
    device_id: DeviceId,
    location: Vec3,
    rotation: Rotator,
    gravity: Vec3,
    eye_position: Vec3,
    tracked: bool,
    last_sample: Option<Instant>,
}

impl TrackedSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            device_id: config.device_id,
            location: config.location,
            rotation: Rotator::from_yaw(config.yaw),
            gravity: Vec3::ZERO,
            eye_position: Vec3::ZERO,
            tracked: false,
            last_sample: None,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Current device pose in the world.
    pub fn transform(&self) -> Transform {
        Transform::from_rotator(self.rotation, self.location)
    }

    pub fn rotation(&self) -> Rotator {
        self.rotation
    }

    /// Last gravity sample, in the device's own frame.
    pub fn orientation_bias(&self) -> Vec3 {
        self.gravity
    }

    /// Levels the device from a gravity sample ("down" in the device frame).
    ///
    /// Only roll and pitch are observable from gravity; yaw and location are kept.
    pub fn set_orientation(&mut self, gravity: Vec3) {
        let (roll, pitch) = roll_pitch_from_gravity(gravity);
        self.gravity = gravity;
        self.rotation.roll = roll;
        self.rotation.pitch = pitch;
    }

    /// Stores a device-local eye sample as a world position and marks the source tracked.
    pub fn set_eye_position(&mut self, local: Vec3) {
        self.set_eye_position_at(local, Instant::now());
    }

    pub(crate) fn set_eye_position_at(&mut self, local: Vec3, at: Instant) {
        self.eye_position = self.transform().transform_point(local);
        self.tracked = true;
        self.last_sample = Some(at);
    }

    pub fn set_tracked(&mut self, tracked: bool) {
        self.tracked = tracked;
    }

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    /// Meaningless unless `is_tracked()`.
    pub fn world_eye_position(&self) -> Vec3 {
        self.eye_position
    }

    /// When the last eye sample arrived.
    pub fn last_sample(&self) -> Option<Instant> {
        self.last_sample
    }
}

/// Returns `(roll, pitch)` in degrees.
fn roll_pitch_from_gravity(g: Vec3) -> (f32, f32) {
    let roll = (-g.y).atan2(g.z).to_degrees();
    let pitch = g.x.atan2((g.y * g.y + g.z * g.z).sqrt()).to_degrees();
    (roll, pitch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn source() -> TrackedSource {
        TrackedSource::new(SourceConfig::new("1"))
    }

    // ── orientation ───────────────────────────────────────────────────────

    #[test]
    fn gravity_straight_down_is_level() {
        let mut s = source();
        s.set_orientation(Vec3::new(0.0, 0.0, 1.0));
        assert_abs_diff_eq!(s.rotation().roll, 0.0);
        assert_abs_diff_eq!(s.rotation().pitch, 0.0);
    }

    #[test]
    fn gravity_along_y_rolls_minus_ninety() {
        let mut s = source();
        s.set_orientation(Vec3::new(0.0, 1.0, 0.0));
        assert_abs_diff_eq!(s.rotation().roll, -90.0, epsilon = 1e-4);
        assert_abs_diff_eq!(s.rotation().pitch, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn gravity_along_x_pitches_ninety() {
        let mut s = source();
        s.set_orientation(Vec3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(s.rotation().pitch, 90.0, epsilon = 1e-4);
    }

    #[test]
    fn gravity_keeps_yaw_and_location() {
        let mut s = TrackedSource::new(SourceConfig::new("1").yaw(30.0).location(Vec3::new(1.0, 2.0, 3.0)));
        s.set_orientation(Vec3::new(0.3, -0.2, 0.9));
        assert_eq!(s.rotation().yaw, 30.0);
        assert_eq!(s.transform().translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.orientation_bias(), Vec3::new(0.3, -0.2, 0.9));
    }

    #[test]
    fn gravity_does_not_touch_tracked_flag() {
        let mut s = source();
        s.set_orientation(Vec3::Z);
        assert!(!s.is_tracked());
    }

    // ── eye position ──────────────────────────────────────────────────────

    #[test]
    fn eye_sample_marks_tracked() {
        let mut s = source();
        s.set_eye_position(Vec3::new(-50.0, 0.0, 10.0));
        assert!(s.is_tracked());
        assert!(s.last_sample().is_some());
        assert_eq!(s.world_eye_position(), Vec3::new(-50.0, 0.0, 10.0));
    }

    #[test]
    fn eye_sample_uses_device_placement() {
        let mut s = TrackedSource::new(SourceConfig::new("1").location(Vec3::new(100.0, 0.0, 20.0)).yaw(180.0));
        s.set_eye_position(Vec3::new(40.0, 0.0, 5.0));
        assert_abs_diff_eq!(s.world_eye_position(), Vec3::new(60.0, 0.0, 25.0), epsilon = 1e-4);
    }

    #[test]
    fn eye_sample_uses_latest_orientation() {
        let mut s = source();
        // Device pitched 90° up: its local forward now points at world up.
        s.set_orientation(Vec3::new(1.0, 0.0, 0.0));
        s.set_eye_position(Vec3::new(10.0, 0.0, 0.0));
        assert_abs_diff_eq!(s.world_eye_position(), Vec3::new(0.0, 0.0, 10.0), epsilon = 1e-4);
    }

    #[test]
    fn lost_clears_tracked_but_keeps_position() {
        let mut s = source();
        s.set_eye_position(Vec3::ONE);
        s.set_tracked(false);
        assert!(!s.is_tracked());
        assert_eq!(s.world_eye_position(), Vec3::ONE);
    }
}

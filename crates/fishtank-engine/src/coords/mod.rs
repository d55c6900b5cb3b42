//! World-space geometry shared by tracking, projection and the host renderer.
//!
//! World frame:
//! - +X forward (through the window, into the scene)
//! - +Y right
//! - +Z up
//! - units are centimetres
//!
//! Vectors, quaternions and matrices are `glam` types; this module adds the
//! pieces `glam` has no opinion about (rotator convention, rigid transforms).

mod color;
mod rotator;
mod transform;
mod viewport;

pub use color::ColorRgba;
pub use rotator::Rotator;
pub use transform::Transform;
pub use viewport::Viewport;

pub use glam::{Mat4, Quat, Vec3, Vec4};

//! Off-axis projection for a physical window.
//!
//! Given the viewer's eye pose and the window's world geometry, the projector
//! replaces the host camera pose and builds an asymmetric perspective matrix so
//! that the rendered image lines up with the physical window.
//!
//! Host conventions (`glam`, column vectors):
//! - view space is left-handed: +x right, +y up, +z forward
//! - depth is reversed Z with an infinite far plane

mod error;
mod frustum;
mod hooks;
mod projector;
mod registry;

pub use error::ProjectionError;
pub use frustum::{aspect_ratio, near_plane, FrustumEdges, TopEdge, MIN_WINDOW_DEPTH};
pub use hooks::{ViewExtension, ViewPoint};
pub use projector::{WindowFrustumProjector, WindowPlane};
pub use registry::{ContextId, ProjectorRegistry, SharedProjector};

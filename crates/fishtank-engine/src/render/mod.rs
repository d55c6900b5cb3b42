//! GPU rendering.
//!
//! Renderers own their GPU resources (pipelines, buffers) and record into the
//! frame's `RenderTarget`. Geometry is in world centimetres; the camera
//! uniform carries the combined view-projection matrix.

mod ctx;
mod lines;

pub use ctx::{RenderCtx, RenderTarget};
pub use lines::{LineBatch, LineRenderer, LineVertex};

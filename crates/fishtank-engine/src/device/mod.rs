//! GPU device and surface management.
//!
//! Creates the wgpu device for a window, keeps the surface and depth buffer
//! sized to it, and hands out per-frame encoders.

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;

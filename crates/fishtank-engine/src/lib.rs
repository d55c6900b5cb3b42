//! Fishtank engine crate.
//!
//! Head-coupled perspective for a physical "virtual window": face trackers
//! stream eye positions over OSC/UDP, the engine fuses them into one viewer
//! position each frame and turns that into an off-axis projection through the
//! window rectangle.
//!
//! - `tracking`: tracking sources and eye-position fusion
//! - `projection`: window frustum projector and host hooks
//! - `ingest`: OSC decoding and the UDP pose listener
//! - `session`: wiring of the above for one rendering context
//!
//! The platform pieces (`window`, `device`, `render`, `input`, `core`) are a
//! small winit/wgpu host used by the viewer.

pub mod coords;
pub mod logging;
pub mod time;

pub mod ingest;
pub mod projection;
pub mod session;
pub mod tracking;

pub mod core;
pub mod device;
pub mod input;
pub mod render;
pub mod window;

//! Session wiring: configuration, startup and the per-frame update.

mod config;
mod window_session;

pub use config::VirtualWindowConfig;
pub use window_session::{FrameUpdate, VirtualWindowSession};

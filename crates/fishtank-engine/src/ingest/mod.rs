//! Pose ingestion over OSC/UDP.
//!
//! Trackers send OSC messages addressed `/face-tracker/<device-id>/<method>`:
//!
//! | method         | arguments        | effect                              |
//! |----------------|------------------|-------------------------------------|
//! | `eye-position` | x, y, z (device) | store world eye position, tracked   |
//! | `lost`         | none             | mark untracked                      |
//! | `gravity`      | x, y, z (device) | level the device (roll and pitch)   |
//!
//! The listener runs on its own thread; every mutation goes through the
//! aggregator lock.

mod dispatch;
mod error;
mod event;
pub mod osc;
mod port;

pub use dispatch::{IngestStats, PoseDispatcher};
pub use error::IngestError;
pub use event::{PoseAddress, PoseEvent};
pub use osc::{OscArg, OscError, OscMessage, OscPacket};
pub use port::{IngestConfig, PoseIngestPort, DEFAULT_PORT};

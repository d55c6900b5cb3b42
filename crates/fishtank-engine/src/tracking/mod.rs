//! Tracking sources and eye-position fusion.
//!
//! Sources are written from the ingest thread and read from the frame thread.
//! `EyePositionAggregator` owns every source behind one lock; nothing outside
//! this module ever holds a `&mut TrackedSource` without that lock.

mod aggregator;
mod error;
mod source;

pub use aggregator::{EyePositionAggregator, FusedEye, SourceHandle};
pub use error::TrackingError;
pub use source::{DeviceId, SourceConfig, TrackedSource};

use thiserror::Error;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// No source is registered under this device id.
    #[error("unknown tracking device `{0}`")]
    UnknownDevice(String),

    /// A source with this device id is already registered.
    #[error("tracking device `{0}` is already registered")]
    DuplicateDevice(String),
}

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::tracking::TrackingError;

use super::osc::OscError;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The listener socket could not be bound. Fatal to the session.
    #[error("failed to bind pose listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start pose listener thread")]
    Spawn(#[source] io::Error),

    #[error("malformed OSC packet from {from:?}: {source}")]
    Osc {
        from: Option<SocketAddr>,
        #[source]
        source: OscError,
    },

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("address `{0}` does not name a device and method")]
    MalformedAddress(String),

    #[error("unknown pose method `{0}`")]
    UnknownMethod(String),

    #[error("`{method}` expects {expected} numeric arguments, got {got}")]
    BadArguments {
        method: &'static str,
        expected: usize,
        got: usize,
    },
}

impl IngestError {
    /// Errors caused by a single bad message; the listener keeps running.
    pub fn is_per_message(&self) -> bool {
        !matches!(self, IngestError::Bind { .. } | IngestError::Spawn(_))
    }
}

use thiserror::Error;

/// Reasons a projection update is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    /// The eye sits on, or in front of, the window plane.
    #[error("eye is on or past the window plane (view depth {depth})")]
    EyeOnWindowPlane { depth: f32 },

    #[error("window has no area")]
    DegenerateWindow,

    /// Near plane or aspect could not be read from the host projection.
    #[error("host projection matrix is not a supported perspective projection")]
    UnsupportedHostProjection,

    #[error("projection produced non-finite values")]
    NonFinite,
}

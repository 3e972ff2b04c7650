use thiserror::Error;

/// Errors surfaced by the particle-field engine and its hosts.
///
/// The animation itself is decorative: hosts log these and skip the effect
/// rather than propagating them to the user.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("invalid field config: {0}")]
    InvalidConfig(&'static str),

    /// The host could not provide a drawing surface (e.g. no 2d context).
    #[error("drawing surface unavailable: {0}")]
    MissingSurface(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = FieldError> = std::result::Result<T, E>;

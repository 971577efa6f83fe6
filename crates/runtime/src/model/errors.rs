use thiserror::Error;

/// Errors from completion-service calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The request never got an HTTP response.
    #[error("network: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("completion service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The response could not be understood.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

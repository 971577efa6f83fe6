//! Tool host error types.
//!
//! None of these cross the tool boundary: [`crate::MoodColorsTool`] turns
//! each of them into text for the caller.

use thiserror::Error;

/// Invalid `get-colors-for-mood` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("mood is required")]
    MissingMood,

    #[error("count must be an integer of at least {min}, got {got}")]
    CountOutOfRange { min: i64, got: String },
}

/// Failures talking to the color webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not the expected JSON envelope.
    #[error("webhook returned an unreadable body")]
    Decode { body: String },

    /// The webhook answered `success: false`.
    #[error("webhook rejected the request: {message}")]
    Rejected { message: String },
}

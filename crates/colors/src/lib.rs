//! Mood color tool host.
//!
//! Serves a single MCP tool, `get-colors-for-mood`, backed by one of three
//! interchangeable [`ColorSource`]s:
//!
//! - [`StaticPalette`]: a built-in table, `count` clamped to its size.
//! - [`WebhookSource`] in [`WebhookMode::Passthrough`]: forwards the request
//!   to a remote webhook as-is.
//! - [`WebhookSource`] in [`WebhookMode::Clamped`]: forces `count` into
//!   `1..=2` and maps rejections to fixed messages.
//!
//! Every call produces exactly one text result; validation, transport and
//! decoding failures are turned into text at the tool boundary.
//!
//! # Example
//!
//! ```
//! use colors::{ColorRequest, StaticPalette};
//!
//! let text = StaticPalette::default().render(&ColorRequest::new("happy", 1));
//! assert_eq!(text, "Colors for happy mood:\nCoral Red (#FF6B6B)");
//! ```

mod error;
mod input;
mod palette;
mod source;
mod tool;

pub use error::{InputError, WebhookError};
pub use input::{ColorRequest, DEFAULT_COUNT, TOOL_NAME, input_schema};
pub use palette::{Color, DEFAULT_PALETTE, StaticPalette};
pub use source::{
    CLAMPED_COUNT_RANGE, COUNT_LIMIT_MESSAGE, ColorSource, DEFAULT_WEBHOOK_URL, FALLBACK_MESSAGE,
    GENERIC_FAILURE_MESSAGE, WebhookMode, WebhookSource,
};
pub use tool::MoodColorsTool;

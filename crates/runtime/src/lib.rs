//! Palette runtime: chat sessions over a completion service and an MCP tool host.
//!
//! # Overview
//!
//! - **Session**: owns a bounded [`Transcript`] and runs one user turn at a
//!   time. A turn makes at most two completion requests: the first offers
//!   the host's tools, the second reports the tool result without them.
//! - **Backend**: trait over completion providers (OpenAI-compatible,
//!   Anthropic).
//! - **ToolHost**: trait over tool execution; [`McpToolHost`] drives an MCP
//!   server child process.
//!
//! # Example
//!
//! ```no_run
//! use runtime::{McpToolHost, OpenAiBackend, Session};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = OpenAiBackend::builder("sk-...", "gpt-4o-mini").build();
//! let tools = McpToolHost::spawn("mood-colors", ["--source", "static"])
//!     .await
//!     .map_err(runtime::Error::ToolHost)?;
//!
//! let mut session = Session::new(backend, tools, "You suggest colors for moods.");
//! let reply = session.chat("I feel calm today").await?;
//! println!("{reply}");
//!
//! session.into_tools().shutdown().await.map_err(runtime::Error::ToolHost)?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
pub mod providers;
mod session;
pub mod tools;
mod transcript;

pub use error::{Error, Result};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolResult,
    ToolSpec, Usage,
};
pub use providers::{
    AnthropicBackend, AnthropicBackendBuilder, AnyBackend, OPENAI_BASE_URL, OpenAiBackend,
    OpenAiBackendBuilder,
};
pub use session::Session;
pub use tools::{EmptyToolHost, McpError, McpToolHost, ToolError, ToolHost};
pub use transcript::{DEFAULT_MAX_PAIRS, Transcript};

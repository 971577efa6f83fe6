//! MCP (Model Context Protocol) server library.
//!
//! This crate serves tools to an MCP client over line-delimited JSON-RPC on
//! stdio. Implement [`ToolHandler`] and hand it to a [`Server`].
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolResult, Server, ServerConfig, Tool, ToolHandler};
//! use serde_json::{Value, json};
//!
//! struct Hello;
//!
//! impl ToolHandler for Hello {
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool {
//!             name: "hello".to_string(),
//!             description: Some("Say hello".to_string()),
//!             input_schema: json!({"type": "object"}),
//!         }]
//!     }
//!
//!     async fn call(&self, _name: &str, _arguments: Value) -> CallToolResult {
//!         CallToolResult::text("hello")
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! let config = ServerConfig {
//!     name: "hello".to_string(),
//!     version: "0.1.0".to_string(),
//! };
//! Server::new(config, Hello).serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId,
    ServerCapabilities, ServerInfo, Tool, ToolContent,
};
pub use server::{MAX_INPUT_SIZE, Server, ServerConfig, ToolHandler};

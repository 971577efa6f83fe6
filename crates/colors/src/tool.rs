//! The `get-colors-for-mood` MCP tool.

use mcp::{CallToolResult, Tool, ToolHandler};
use serde_json::Value;

use crate::input::{ColorRequest, TOOL_NAME, input_schema};
use crate::source::ColorSource;

const DESCRIPTION: &str = "Get a list of colors that match a mood. Returns color names with hex codes.";

/// Exposes a [`ColorSource`] as the `get-colors-for-mood` tool.
pub struct MoodColorsTool<S> {
    source: S,
}

impl<S: ColorSource> MoodColorsTool<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn descriptor(&self) -> Tool {
        Tool {
            name: TOOL_NAME.to_string(),
            description: Some(DESCRIPTION.to_string()),
            input_schema: input_schema(self.source.max_count()),
        }
    }
}

impl<S: ColorSource> ToolHandler for MoodColorsTool<S> {
    fn tools(&self) -> Vec<Tool> {
        vec![self.descriptor()]
    }

    async fn call(&self, _name: &str, arguments: Value) -> CallToolResult {
        let request = match ColorRequest::from_arguments(&arguments) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, %arguments, "invalid tool arguments");
                return CallToolResult::error(format!("Invalid input: {e}"));
            }
        };

        tracing::debug!(source = self.source.name(), mood = %request.mood, count = request.count, "looking up colors");
        CallToolResult::text(self.source.colors(&request).await)
    }
}

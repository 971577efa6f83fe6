//! MCP-backed tool host.
//!
//! Drives a tool server child process over stdio with the rmcp client.

use super::{ToolError, ToolHost};
use crate::model::{ToolCall, ToolSpec};
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, Tool},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::{Map, Value};
use tokio::process::Command;

/// Error type for MCP connection failures.
pub type McpError = Box<dyn std::error::Error + Send + Sync>;

/// Tool host backed by an MCP server process.
///
/// Tool descriptors are fetched once at connect time.
pub struct McpToolHost {
    service: RunningService<RoleClient, ()>,
    specs: Vec<ToolSpec>,
}

impl McpToolHost {
    /// Start `command` with `args`, complete the handshake and cache its tools.
    pub async fn spawn(
        command: impl AsRef<str>,
        args: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, McpError> {
        let command = command.as_ref();
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        tracing::debug!(%command, ?args, "spawning tool server");

        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(&args);
        }))?;
        let service = ().serve(transport).await?;

        let specs: Vec<ToolSpec> = service
            .list_tools(Default::default())
            .await?
            .tools
            .into_iter()
            .map(ToolSpec::from)
            .collect();
        tracing::info!(%command, tools = specs.len(), "connected to tool server");

        Ok(Self { service, specs })
    }

    /// Close the connection and terminate the server process.
    pub async fn shutdown(self) -> Result<(), McpError> {
        let reason = self.service.cancel().await?;
        tracing::debug!(?reason, "tool server connection closed");
        Ok(())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: ToolArguments,
    ) -> Result<CallToolResult, McpError> {
        let params = CallToolRequestParams {
            name: name.to_string().into(),
            arguments: arguments.0,
            meta: None,
            task: None,
        };
        Ok(self.service.call_tool(params).await?)
    }
}

impl From<Tool> for ToolSpec {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
            schema: Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

/// Arguments in the shape MCP expects: an object, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments(pub Option<Map<String, Value>>);

impl TryFrom<Value> for ToolArguments {
    type Error = ToolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self(None)),
            Value::Object(map) => Ok(Self(Some(map))),
            other => Err(ToolError::InvalidInput(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

/// Text blocks of a call result joined by newlines.
fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|content| content.as_text())
        .map(|text| text.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

impl ToolHost for McpToolHost {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        if !self.specs.iter().any(|spec| spec.name == call.name) {
            return Err(ToolError::NotFound(call.name.clone()));
        }

        let arguments = ToolArguments::try_from(call.input.clone())?;
        let result = self
            .call_tool(&call.name, arguments)
            .await
            .map_err(|e| ToolError::Connection(e.to_string()))?;

        let text = result_text(&result);
        if result.is_error.unwrap_or(false) {
            return Err(ToolError::Execution(text));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_arguments_pass_through() {
        let args = ToolArguments::try_from(json!({"mood": "happy"})).unwrap();
        assert_eq!(args.0.unwrap()["mood"], "happy");
    }

    #[test]
    fn null_arguments_become_none() {
        assert_eq!(ToolArguments::try_from(Value::Null).unwrap(), ToolArguments(None));
    }

    #[test]
    fn scalar_arguments_are_rejected() {
        let err = ToolArguments::try_from(json!("happy")).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}

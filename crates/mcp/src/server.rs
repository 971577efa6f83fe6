//! MCP server loop (line-delimited JSON-RPC over stdio).

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId,
    ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};

/// Maximum accepted input line (1MB).
pub const MAX_INPUT_SIZE: usize = 1024 * 1024;

/// Tools served by a [`Server`].
///
/// `call` must always produce a result; failures are reported to the
/// caller as an error result, never as a protocol error.
pub trait ToolHandler: Send + Sync {
    /// Descriptors advertised by `tools/list`.
    fn tools(&self) -> Vec<Tool>;

    /// Run the named tool. Only called for names listed by [`tools`](Self::tools).
    fn call(&self, name: &str, arguments: Value) -> impl Future<Output = CallToolResult> + Send;
}

/// Identity reported to clients during initialization.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

/// An MCP server answering one request at a time.
pub struct Server<H> {
    config: ServerConfig,
    handler: H,
}

impl<H: ToolHandler> Server<H> {
    pub fn new(config: ServerConfig, handler: H) -> Self {
        Self { config, handler }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Serve on the process stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve requests read from `reader`, writing replies to `writer`.
    ///
    /// Returns when the reader reaches EOF. Malformed or oversized lines are
    /// answered with an error and the loop keeps going.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        tracing::info!(server = %self.config.name, "serving MCP on stdio");

        loop {
            let response = match read_frame(&mut reader, &mut buf).await? {
                Frame::Eof => {
                    tracing::info!("input closed, shutting down");
                    return Ok(());
                }
                Frame::Oversized(size) => {
                    let e = Error::InputTooLarge {
                        size,
                        max: MAX_INPUT_SIZE,
                    };
                    tracing::warn!(error = %e, "rejecting oversized message");
                    Some(JsonRpcResponse::failure(
                        RequestId::Null,
                        JsonRpcError::invalid_request(e.to_string()),
                    ))
                }
                Frame::Line => match std::str::from_utf8(&buf) {
                    Ok(line) => self.handle_line(line).await,
                    Err(e) => {
                        tracing::warn!(error = %e, "message is not UTF-8");
                        Some(JsonRpcResponse::failure(
                            RequestId::Null,
                            JsonRpcError::parse(format!("invalid UTF-8: {e}")),
                        ))
                    }
                },
            };

            let Some(response) = response else {
                continue;
            };

            let json = serde_json::to_string(&response)?;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    /// Handle one raw input line, returning the reply if one is due.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Err(e) = check_size(line) {
            tracing::warn!(error = %e, "rejecting oversized message");
            return Some(JsonRpcResponse::failure(
                RequestId::Null,
                JsonRpcError::invalid_request(e.to_string()),
            ));
        }

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "unparsable message");
                return Some(JsonRpcResponse::failure(
                    RequestId::Null,
                    JsonRpcError::parse(e.to_string()),
                ));
            }
        };

        self.handle(request).await
    }

    /// Handle a decoded request. Notifications produce no reply.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, id = ?request.id, "request");

        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "notification");
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            ));
        }

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params).map(to_value),
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => Ok(to_value(ListToolsResult {
                tools: self.handler.tools(),
            })),
            "tools/call" => self.call_tool(request.params).await.map(to_value),
            method => Err(JsonRpcError::method_not_found(method)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                tracing::warn!(method = %request.method, %error, "request failed");
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    fn initialize(&self, params: Option<Value>) -> std::result::Result<InitializeResult, JsonRpcError> {
        let params: InitializeParams = parse_params(params)?;
        if let Some(client) = &params.client_info {
            tracing::info!(client = %client.name, version = ?client.version, "client connected");
        }

        Ok(InitializeResult {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: ServerInfo {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
            },
        })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
    ) -> std::result::Result<CallToolResult, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;

        if !self.handler.tools().iter().any(|t| t.name == params.name) {
            return Err(JsonRpcError::invalid_params(format!(
                "tool not found: {}",
                params.name
            )));
        }

        let arguments = params.arguments.unwrap_or(Value::Null);
        tracing::info!(tool = %params.name, %arguments, "tool call");

        let result = self.handler.call(&params.name, arguments).await;
        tracing::info!(tool = %params.name, is_error = result.is_error, "tool result");
        Ok(result)
    }
}

/// Outcome of reading one input line.
#[derive(Debug, PartialEq)]
enum Frame {
    /// A complete line is in the buffer.
    Line,
    /// The line exceeded [`MAX_INPUT_SIZE`] and was discarded.
    Oversized(usize),
    Eof,
}

/// Read one line into `buf`, holding at most `MAX_INPUT_SIZE + 1` bytes.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = MAX_INPUT_SIZE as u64 + 1;
    if (&mut *reader).take(limit).read_until(b'\n', buf).await? == 0 {
        return Ok(Frame::Eof);
    }
    if buf.len() > MAX_INPUT_SIZE && buf.last() != Some(&b'\n') {
        let size = buf.len() + skip_line(reader).await?;
        buf.clear();
        return Ok(Frame::Oversized(size));
    }
    Ok(Frame::Line)
}

/// Consume input up to and including the next newline.
async fn skip_line<R>(reader: &mut R) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(skipped);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(skipped + end + 1);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

fn check_size(line: &str) -> Result<()> {
    if line.len() > MAX_INPUT_SIZE {
        return Err(Error::InputTooLarge {
            size: line.len(),
            max: MAX_INPUT_SIZE,
        });
    }
    Ok(())
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> std::result::Result<T, JsonRpcError> {
    let params = params.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

fn to_value(result: impl serde::Serialize) -> Value {
    serde_json::to_value(result).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl ToolHandler for Echo {
        fn tools(&self) -> Vec<Tool> {
            vec![Tool {
                name: "echo".into(),
                description: Some("Echo the input".into()),
                input_schema: json!({"type": "object"}),
            }]
        }

        async fn call(&self, _name: &str, arguments: Value) -> CallToolResult {
            CallToolResult::text(arguments.to_string())
        }
    }

    fn server() -> Server<Echo> {
        Server::new(
            ServerConfig {
                name: "test".into(),
                version: "0.0.1".into(),
            },
            Echo,
        )
    }

    async fn reply(line: &str) -> Value {
        let response = server().handle_line(line).await.expect("reply expected");
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn initialize_echoes_protocol_version() {
        let resp = reply(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{},"clientInfo":{"name":"c","version":"1"}}}"#,
        )
        .await;
        assert_eq!(resp["result"]["protocolVersion"], "2025-06-18");
        assert_eq!(resp["result"]["serverInfo"]["name"], "test");
        assert!(resp["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let resp = server()
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn lists_tools() {
        let resp = reply(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        assert_eq!(resp["result"]["tools"][0]["name"], "echo");
        assert_eq!(resp["result"]["tools"][0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn calls_tool() {
        let resp = reply(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo","arguments":{"a":1}}}"#,
        )
        .await;
        assert_eq!(resp["id"], 3);
        assert_eq!(resp["result"]["content"][0]["text"], r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let resp = reply(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"nope"}}"#,
        )
        .await;
        assert_eq!(resp["error"]["code"], JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method() {
        let resp = reply(r#"{"jsonrpc":"2.0","id":"x","method":"resources/list"}"#).await;
        assert_eq!(resp["id"], "x");
        assert_eq!(resp["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn garbage_is_parse_error() {
        let resp = reply("not json").await;
        assert_eq!(resp["id"], Value::Null);
        assert_eq!(resp["error"]["code"], JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn serve_answers_in_order_until_eof() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["id"], 2);
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_a_parse_error_and_serving_continues() {
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"echo","arguments":{"a":""#.to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\"}}}\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let mut output = Vec::new();
        server().serve(input.as_slice(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], Value::Null);
        assert_eq!(lines[0]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(lines[1]["id"], 2);
        assert!(lines[1]["result"].is_object());
    }

    #[tokio::test]
    async fn oversized_line_is_rejected_without_ending_the_session() {
        let mut input = vec![b'x'; MAX_INPUT_SIZE + 10];
        input.push(b'\n');
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#);
        input.push(b'\n');

        let mut output = Vec::new();
        server().serve(input.as_slice(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["code"], JsonRpcError::INVALID_REQUEST);
        assert_eq!(lines[1]["id"], 7);
    }

    #[tokio::test]
    async fn read_frame_caps_buffered_bytes() {
        let mut input = vec![b'y'; MAX_INPUT_SIZE * 2];
        input.extend_from_slice(b"\nnext\n");
        let mut reader = BufReader::new(input.as_slice());
        let mut buf = Vec::new();

        let frame = read_frame(&mut reader, &mut buf).await.unwrap();
        assert_eq!(frame, Frame::Oversized(MAX_INPUT_SIZE * 2 + 1));

        assert_eq!(read_frame(&mut reader, &mut buf).await.unwrap(), Frame::Line);
        assert_eq!(buf, b"next\n");
        assert_eq!(read_frame(&mut reader, &mut buf).await.unwrap(), Frame::Eof);
    }

    #[tokio::test]
    async fn line_at_the_limit_is_accepted() {
        let mut input = vec![b' '; MAX_INPUT_SIZE];
        input.push(b'\n');
        let mut reader = BufReader::new(input.as_slice());
        let mut buf = Vec::new();

        assert_eq!(read_frame(&mut reader, &mut buf).await.unwrap(), Frame::Line);
        assert_eq!(buf.len(), MAX_INPUT_SIZE + 1);
    }
}

//! Drives the `mood-colors` binary through the runtime's MCP tool host.

use runtime::{McpToolHost, ToolCall, ToolError, ToolHost};
use serde_json::{Value, json};

const SERVER: &str = env!("CARGO_BIN_EXE_mood-colors");

async fn connect() -> McpToolHost {
    McpToolHost::spawn(SERVER, ["--source", "static"])
        .await
        .expect("mood-colors should start and answer the handshake")
}

fn call(input: Value) -> ToolCall {
    ToolCall {
        id: "call_1".into(),
        name: "get-colors-for-mood".into(),
        input,
    }
}

#[tokio::test]
async fn lists_the_mood_tool() {
    let host = connect().await;

    let specs = host.specs();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].name, "get-colors-for-mood");
    assert!(specs[0].description.contains("mood"));
    assert_eq!(specs[0].schema["properties"]["mood"]["type"], "string");
    assert_eq!(specs[0].schema["properties"]["count"]["minimum"], 1);
    assert_eq!(specs[0].schema["required"], json!(["mood"]));

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn happy_with_one_color() {
    let host = connect().await;

    let text = host
        .execute(&call(json!({"mood": "happy", "count": 1})))
        .await
        .unwrap();
    assert_eq!(text, "Colors for happy mood:\nCoral Red (#FF6B6B)");

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_count_is_an_execution_error() {
    let host = connect().await;

    let err = host
        .execute(&call(json!({"mood": "happy", "count": 0})))
        .await
        .unwrap_err();
    match err {
        ToolError::Execution(message) => assert!(
            message.starts_with("Invalid input: "),
            "unexpected message: {message}"
        ),
        other => panic!("expected execution error, got {other:?}"),
    }

    // The server survives a rejected call.
    let text = host.execute(&call(json!({"mood": "calm"}))).await.unwrap();
    assert!(text.starts_with("Colors for calm mood:\n"));

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn unknown_tool_is_not_forwarded() {
    let host = connect().await;

    let mut request = call(json!({"mood": "happy"}));
    request.name = "get-weather".into();
    let err = host.execute(&request).await.unwrap_err();
    assert_eq!(err, ToolError::NotFound("get-weather".into()));

    host.shutdown().await.unwrap();
}

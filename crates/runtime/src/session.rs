//! Session management: one user turn at a time over a bounded transcript.

use crate::model::{Backend, Message, ModelRequest, Part, Role, ToolCall, ToolResult};
use crate::tools::ToolHost;
use crate::transcript::{DEFAULT_MAX_PAIRS, Transcript};
use crate::Result;
use uuid::Uuid;

/// What the first completion of a turn asked for.
#[derive(Debug, Clone, PartialEq)]
enum FirstReply {
    /// Plain reply, possibly empty.
    Text(String),
    /// The model wants a tool. Only the first requested call is run;
    /// `ignored` counts the others.
    ToolUse {
        text: String,
        call: ToolCall,
        ignored: usize,
    },
}

impl From<Message> for FirstReply {
    fn from(message: Message) -> Self {
        let text = message.text();
        let mut calls = message.tool_calls().into_iter();
        match calls.next() {
            Some(call) => Self::ToolUse {
                text,
                call,
                ignored: calls.count(),
            },
            None => Self::Text(text),
        }
    }
}

/// A conversation session.
///
/// Owns the transcript; every turn runs to completion before the next
/// one starts.
pub struct Session<B, T> {
    pub id: Uuid,
    backend: B,
    tools: T,
    transcript: Transcript,
    max_pairs: usize,
}

impl<B: Backend, T: ToolHost> Session<B, T> {
    /// Create a new session whose transcript starts with `system`.
    pub fn new(backend: B, tools: T, system: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend,
            tools,
            transcript: Transcript::new(system),
            max_pairs: DEFAULT_MAX_PAIRS,
        }
    }

    /// Set how many recent message pairs survive trimming.
    pub fn with_max_pairs(mut self, max_pairs: usize) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    /// End the session, handing back the tool host for shutdown.
    pub fn into_tools(self) -> T {
        self.tools
    }

    /// Send a user message and get the reply text for this turn.
    ///
    /// If the completion service fails, the transcript is restored to its
    /// state before the turn and the error is returned.
    pub async fn chat(&mut self, user_input: &str) -> Result<String> {
        let checkpoint = self.transcript.len();

        match self.turn(user_input).await {
            Ok(reply) => {
                let evicted = self.transcript.trim(self.max_pairs);
                if evicted > 0 {
                    tracing::debug!(session = %self.id, evicted, "trimmed transcript");
                }
                Ok(reply)
            }
            Err(e) => {
                self.transcript.truncate(checkpoint);
                Err(e)
            }
        }
    }

    async fn turn(&mut self, user_input: &str) -> Result<String> {
        self.transcript.push(Message::user(user_input));
        let mut output = Vec::new();

        let first = self.complete(true).await?;
        match FirstReply::from(first) {
            FirstReply::Text(text) => {
                if !text.is_empty() {
                    self.transcript.push(Message::assistant(text.clone()));
                    output.push(text);
                }
            }
            FirstReply::ToolUse {
                text,
                call,
                ignored,
            } => {
                if ignored > 0 {
                    tracing::warn!(session = %self.id, ignored, "only the first tool call is executed");
                }

                let mut parts = Vec::new();
                if !text.is_empty() {
                    parts.push(Part::Text(text.clone()));
                    output.push(text);
                }
                parts.push(Part::ToolCall(call.clone()));
                self.transcript.push(Message {
                    role: Role::Assistant,
                    parts,
                });

                let result = self.invoke(&call).await;
                self.transcript.push(Message::tool_result(result));

                // The follow-up is not offered tools.
                let follow_up = self.complete(false).await?;
                if !follow_up.tool_calls().is_empty() {
                    tracing::warn!(session = %self.id, "ignoring tool calls in follow-up reply");
                }
                let text = follow_up.text();
                if !text.is_empty() {
                    self.transcript.push(Message::assistant(text.clone()));
                    output.push(text);
                }
            }
        }

        Ok(output.join("\n"))
    }

    async fn complete(&self, offer_tools: bool) -> Result<Message> {
        let tools = if offer_tools { self.tools.specs() } else { &[] };
        tracing::debug!(
            session = %self.id,
            messages = self.transcript.len(),
            tools = tools.len(),
            "completion request"
        );

        let response = self
            .backend
            .call(ModelRequest {
                messages: self.transcript.messages(),
                tools,
            })
            .await?;

        tracing::debug!(
            session = %self.id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "completion response"
        );
        Ok(response.message)
    }

    async fn invoke(&self, call: &ToolCall) -> ToolResult {
        tracing::debug!(session = %self.id, tool = %call.name, input = %call.input, "calling tool");

        match self.tools.execute(call).await {
            Ok(output) => ToolResult::Success {
                tool_call_id: call.id.clone(),
                output,
            },
            Err(error) => {
                tracing::warn!(session = %self.id, tool = %call.name, %error, "tool call failed");
                ToolResult::Failure {
                    tool_call_id: call.id.clone(),
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelError, ModelResponse, ToolSpec, Usage};
    use crate::tools::{EmptyToolHost, ToolError};
    use crate::Error;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const SYSTEM: &str = "You suggest colors for moods.";

    /// Replays canned replies and records (message count, tool count) per call.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<std::result::Result<Message, ModelError>>>,
        requests: Mutex<Vec<(usize, usize)>>,
    }

    impl Scripted {
        fn new(replies: Vec<std::result::Result<Message, ModelError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::default(),
            }
        }

        fn requests(&self) -> Vec<(usize, usize)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Backend for Scripted {
        async fn call(
            &self,
            request: ModelRequest<'_>,
        ) -> std::result::Result<ModelResponse, ModelError> {
            self.requests
                .lock()
                .unwrap()
                .push((request.messages.len(), request.tools.len()));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected completion request")?;
            Ok(ModelResponse {
                message: reply,
                usage: Usage::default(),
            })
        }
    }

    impl Backend for &Scripted {
        async fn call(
            &self,
            request: ModelRequest<'_>,
        ) -> std::result::Result<ModelResponse, ModelError> {
            (**self).call(request).await
        }
    }

    /// A single color tool that records the calls it receives.
    struct Colors {
        specs: Vec<ToolSpec>,
        fail: bool,
        calls: Mutex<Vec<ToolCall>>,
    }

    impl Colors {
        fn new(fail: bool) -> Self {
            Self {
                specs: vec![ToolSpec {
                    name: "get-colors-for-mood".into(),
                    description: "Colors for a mood".into(),
                    schema: json!({"type": "object"}),
                }],
                fail,
                calls: Mutex::default(),
            }
        }
    }

    impl ToolHost for Colors {
        fn specs(&self) -> &[ToolSpec] {
            &self.specs
        }

        async fn execute(&self, call: &ToolCall) -> std::result::Result<String, ToolError> {
            self.calls.lock().unwrap().push(call.clone());
            if self.fail {
                return Err(ToolError::Connection("server exited".into()));
            }
            Ok("Colors for happy mood:\nCoral Red (#FF6B6B)".into())
        }
    }

    fn tool_call(id: &str, mood: &str) -> Part {
        Part::ToolCall(ToolCall {
            id: id.into(),
            name: "get-colors-for-mood".into(),
            input: json!({"mood": mood, "count": 1}),
        })
    }

    fn wants_tool(parts: Vec<Part>) -> std::result::Result<Message, ModelError> {
        Ok(Message {
            role: Role::Assistant,
            parts,
        })
    }

    #[tokio::test]
    async fn plain_reply_offers_tools_once() {
        let backend = Scripted::new(vec![Ok(Message::assistant("Try coral."))]);
        let mut session = Session::new(&backend, Colors::new(false), SYSTEM);

        let reply = session.chat("I feel happy").await.unwrap();

        assert_eq!(reply, "Try coral.");
        assert_eq!(backend.requests(), vec![(2, 1)]);
        assert_eq!(session.transcript().len(), 3);
    }

    #[tokio::test]
    async fn tool_turn_runs_two_step_pipeline() {
        let backend = Scripted::new(vec![
            wants_tool(vec![Part::Text("Let me check.".into()), tool_call("c1", "happy")]),
            Ok(Message::assistant("Coral Red fits a happy mood.")),
        ]);
        let tools = Colors::new(false);
        let mut session = Session::new(&backend, tools, SYSTEM);

        let reply = session.chat("colors for happy?").await.unwrap();

        assert_eq!(reply, "Let me check.\nCoral Red fits a happy mood.");
        // Second request sees the call and its result but no tool list.
        assert_eq!(backend.requests(), vec![(2, 1), (4, 0)]);

        let roles: Vec<Role> = session.transcript().messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        let result = session.transcript().messages()[3].tool_results().next().unwrap();
        assert_eq!(result.tool_call_id(), "c1");
        assert_eq!(result.content(), "Colors for happy mood:\nCoral Red (#FF6B6B)");
    }

    #[tokio::test]
    async fn only_first_tool_call_is_executed() {
        let backend = Scripted::new(vec![
            wants_tool(vec![tool_call("c1", "happy"), tool_call("c2", "sad")]),
            Ok(Message::assistant("Here you go.")),
        ]);
        let mut session = Session::new(&backend, Colors::new(false), SYSTEM);

        session.chat("happy and sad").await.unwrap();

        let calls = session.tools().calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "c1");
        // The dropped call is not left dangling in the transcript.
        assert_eq!(session.transcript().messages()[2].tool_calls().len(), 1);
    }

    #[tokio::test]
    async fn tool_failure_is_reported_to_the_model() {
        let backend = Scripted::new(vec![
            wants_tool(vec![tool_call("c1", "happy")]),
            Ok(Message::assistant("The color service is down.")),
        ]);
        let mut session = Session::new(&backend, Colors::new(true), SYSTEM);

        let reply = session.chat("happy").await.unwrap();

        assert_eq!(reply, "The color service is down.");
        let result = session.transcript().messages()[3].tool_results().next().unwrap();
        assert!(result.is_error());
        assert_eq!(result.content(), "tool host unavailable: server exited");
    }

    #[tokio::test]
    async fn completion_failure_rolls_back_the_turn() {
        let backend = Scripted::new(vec![
            Ok(Message::assistant("hello")),
            wants_tool(vec![tool_call("c1", "happy")]),
            Err(ModelError::Network("connection reset".into())),
        ]);
        let mut session = Session::new(&backend, Colors::new(false), SYSTEM);

        session.chat("hi").await.unwrap();
        let before = session.transcript().len();

        let err = session.chat("happy").await.unwrap_err();

        assert!(matches!(err, Error::Model(ModelError::Network(_))));
        assert_eq!(session.transcript().len(), before);
        assert_eq!(session.transcript().messages().last().unwrap().text(), "hello");
    }

    #[tokio::test]
    async fn long_sessions_keep_system_and_newest_messages() {
        let mut replies = Vec::new();
        for n in 0..30 {
            replies.push(wants_tool(vec![tool_call(&format!("c{n}"), "calm")]));
            replies.push(Ok(Message::assistant(format!("reply {n}"))));
        }
        let backend = Scripted::new(replies);
        let mut session = Session::new(&backend, Colors::new(false), SYSTEM).with_max_pairs(10);

        for n in 0..30 {
            session.chat(&format!("turn {n}")).await.unwrap();
            assert!(session.transcript().len() <= 21);
            assert_eq!(session.transcript().system().text(), SYSTEM);
        }

        let last = session.transcript().messages().last().unwrap();
        assert_eq!(last.text(), "reply 29");
        assert_eq!(session.transcript().len(), 21);
    }

    #[tokio::test]
    async fn works_without_tools() {
        let backend = Scripted::new(vec![Ok(Message::assistant("No tools here."))]);
        let mut session = Session::new(&backend, EmptyToolHost, SYSTEM);

        assert_eq!(session.chat("hi").await.unwrap(), "No tools here.");
        assert_eq!(backend.requests(), vec![(2, 0)]);
    }

    #[test]
    fn first_reply_classification() {
        let text = FirstReply::from(Message::assistant("just text"));
        assert_eq!(text, FirstReply::Text("just text".into()));

        let reply = FirstReply::from(Message {
            role: Role::Assistant,
            parts: vec![tool_call("a", "x"), tool_call("b", "y"), tool_call("c", "z")],
        });
        match reply {
            FirstReply::ToolUse { call, ignored, text } => {
                assert_eq!(call.id, "a");
                assert_eq!(ignored, 2);
                assert!(text.is_empty());
            }
            other => panic!("expected tool use, got {other:?}"),
        }
    }
}

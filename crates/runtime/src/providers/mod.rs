//! LLM provider adapters.
//!
//! Each provider implements [`Backend`] for its specific API.

mod anthropic;
mod openai;

pub use anthropic::{AnthropicBackend, AnthropicBackendBuilder};
pub use openai::{OPENAI_BASE_URL, OpenAiBackend, OpenAiBackendBuilder};

use crate::model::{Backend, Message, ModelError, ModelRequest, ModelResponse, Role};
use std::collections::HashSet;

/// A backend picked at runtime from configuration.
pub enum AnyBackend {
    OpenAi(OpenAiBackend),
    Anthropic(AnthropicBackend),
}

impl std::fmt::Display for AnyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi(backend) => write!(f, "{backend}"),
            Self::Anthropic(backend) => write!(f, "{backend}"),
        }
    }
}

impl Backend for AnyBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        match self {
            Self::OpenAi(backend) => backend.call(request).await,
            Self::Anthropic(backend) => backend.call(request).await,
        }
    }
}

impl From<OpenAiBackend> for AnyBackend {
    fn from(backend: OpenAiBackend) -> Self {
        Self::OpenAi(backend)
    }
}

impl From<AnthropicBackend> for AnyBackend {
    fn from(backend: AnthropicBackend) -> Self {
        Self::Anthropic(backend)
    }
}

/// Messages that can go on the wire.
///
/// Trimming may evict an assistant tool call while keeping its result;
/// providers reject results for calls they never saw, so those are skipped.
pub(crate) fn sendable(messages: &[Message]) -> impl Iterator<Item = &Message> {
    let mut seen_calls = HashSet::new();
    messages.iter().filter(move |message| {
        for call in message.tool_calls() {
            seen_calls.insert(call.id);
        }
        if message.role != Role::Tool {
            return true;
        }
        let answered = message
            .tool_results()
            .any(|result| seen_calls.contains(result.tool_call_id()));
        if !answered {
            tracing::debug!("skipping tool result whose call was trimmed");
        }
        answered
    })
}

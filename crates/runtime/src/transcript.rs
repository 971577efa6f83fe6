//! Bounded conversation history.

use crate::model::{Message, Role};

/// Default number of recent message pairs kept by [`Transcript::trim`].
pub const DEFAULT_MAX_PAIRS: usize = 10;

/// Conversation history sent to the completion service.
///
/// The first message is always the system instruction given at
/// construction; trimming never evicts it.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system)],
        }
    }

    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages after the system instruction.
    pub fn history(&self) -> &[Message] {
        &self.messages[1..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history().is_empty()
    }

    /// Append a message. System messages are only accepted at construction.
    pub fn push(&mut self, message: Message) {
        debug_assert_ne!(message.role, Role::System, "system message must stay first");
        self.messages.push(message);
    }

    /// Drop everything appended after `len`, never the system message.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len.max(1));
    }

    /// Keep the system message plus the newest `2 * max_pairs` messages.
    ///
    /// Returns the number of evicted messages.
    pub fn trim(&mut self, max_pairs: usize) -> usize {
        let keep = max_pairs.saturating_mul(2);
        let history = self.messages.len() - 1;
        if history <= keep {
            return 0;
        }
        let evicted = history - keep;
        self.messages.drain(1..1 + evicted);
        evicted
    }
}

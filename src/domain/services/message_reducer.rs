#[cfg(test)]
#[path = "message_reducer_test.rs"]
mod tests;

use crate::domain::models::ChatMessage;
use crate::domain::models::StreamFragment;

/// What applying one fragment did to the message list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReduceOutcome {
    /// No turn was active; nothing changed.
    Ignored,
    /// The in-progress assistant message was created or replaced.
    Updated,
    /// The turn finished. Holds the sealed content, `None` for an empty turn.
    Sealed(Option<String>),
    /// The turn ended with an error fragment.
    Failed(String),
}

/// Folds streamed fragments for one assistant turn at a time into an ordered
/// message list. The last element is the only one that may still change, and
/// only while a turn is streaming.
#[derive(Clone, Debug, Default)]
pub struct MessageReducer {
    messages: Vec<ChatMessage>,
    buffer: String,
    streaming: bool,
    in_progress: bool,
}

impl MessageReducer {
    pub fn new() -> MessageReducer {
        return MessageReducer::default();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        return &self.messages;
    }

    pub fn buffer(&self) -> &str {
        return &self.buffer;
    }

    pub fn is_streaming(&self) -> bool {
        return self.streaming;
    }

    /// Records the user's message and starts waiting for the assistant turn.
    pub fn begin_turn(&mut self, user_text: &str) {
        self.messages.push(ChatMessage::user(user_text));
        self.buffer.clear();
        self.in_progress = false;
        self.streaming = true;
    }

    pub fn apply(&mut self, fragment: &StreamFragment) -> ReduceOutcome {
        if !self.streaming {
            tracing::debug!(fragment = ?fragment, "Ignoring fragment outside of a turn");
            return ReduceOutcome::Ignored;
        }

        match fragment {
            StreamFragment::Stream {
                content,
                done: false,
            } => {
                self.push_content(content);
                return ReduceOutcome::Updated;
            }
            // Content on the closing frame is not part of the reply.
            StreamFragment::Stream { done: true, .. } => {
                return ReduceOutcome::Sealed(self.seal());
            }
            StreamFragment::Error { content } => {
                self.end_turn();
                return ReduceOutcome::Failed(content.to_string());
            }
        }
    }

    /// Ends the active turn without sealing, leaving any partial message
    /// as-is. Returns whether a turn was active.
    pub fn interrupt(&mut self) -> bool {
        let was_streaming = self.streaming;
        self.end_turn();
        return was_streaming;
    }

    fn push_content(&mut self, content: &str) {
        if !self.in_progress {
            self.buffer = content.to_string();
            self.messages.push(ChatMessage::assistant(&self.buffer));
            self.in_progress = true;
            return;
        }

        self.buffer.push_str(content);
        if let Some(last) = self.messages.last_mut() {
            last.set_content(&self.buffer);
        }
    }

    fn seal(&mut self) -> Option<String> {
        if !self.in_progress {
            self.end_turn();
            return None;
        }

        // Capture first, then clear.
        let sealed = std::mem::take(&mut self.buffer);
        if let Some(last) = self.messages.last_mut() {
            last.set_content(&sealed);
        }
        self.end_turn();

        return Some(sealed);
    }

    fn end_turn(&mut self) {
        self.buffer.clear();
        self.in_progress = false;
        self.streaming = false;
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> ChatMessage {
        return ChatMessage {
            id: None,
            role,
            content: content.to_string(),
        };
    }

    pub fn user(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::Assistant, content);
    }

    pub fn is_assistant(&self) -> bool {
        return self.role == Role::Assistant;
    }

    /// Replaces the whole content with a snapshot. Streaming writers always
    /// pass the full accumulation here, never a delta.
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
    }
}

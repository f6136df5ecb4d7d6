#[cfg(test)]
#[path = "fragment_test.rs"]
mod tests;

use serde::Deserialize;
use serde::Serialize;

use super::ClientError;

/// One decoded frame received on a chat connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFragment {
    Stream {
        content: String,
        #[serde(default)]
        done: bool,
    },
    Error {
        content: String,
    },
}

impl StreamFragment {
    pub fn stream(content: &str, done: bool) -> StreamFragment {
        return StreamFragment::Stream {
            content: content.to_string(),
            done,
        };
    }

    pub fn error(content: &str) -> StreamFragment {
        return StreamFragment::Error {
            content: content.to_string(),
        };
    }

    pub fn decode(payload: &str) -> Result<StreamFragment, ClientError> {
        return serde_json::from_str::<StreamFragment>(payload)
            .map_err(|err| return ClientError::MalformedFragment(err.to_string()));
    }

    pub fn is_done(&self) -> bool {
        return matches!(self, StreamFragment::Stream { done: true, .. });
    }
}

/// A user turn as it goes over the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingFrame {
    pub persona_id: String,
    pub content: String,
}

impl OutgoingFrame {
    pub fn new(persona_id: &str, content: &str) -> OutgoingFrame {
        return OutgoingFrame {
            persona_id: persona_id.to_string(),
            content: content.to_string(),
        };
    }

    pub fn encode(&self) -> Result<String, ClientError> {
        return serde_json::to_string(self)
            .map_err(|err| return ClientError::TransportError(err.to_string()));
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use thiserror::Error;

/// Errors surfaced by the chat core and its REST collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Not authenticated: a valid access token is required")]
    Unauthenticated,

    #[error("Thread creation failed: {0}")]
    ThreadCreationFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timed out after {0}ms")]
    ConnectionTimedOut(u64),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Malformed fragment: {0}")]
    MalformedFragment(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Session is already open or opening")]
    AlreadyOpen,

    #[error("Superseded by a newer open or close")]
    Superseded,
}

impl ClientError {
    /// Failures the caller may retry by calling `open` again.
    pub fn is_recoverable(&self) -> bool {
        return matches!(
            self,
            ClientError::ThreadCreationFailed(_)
                | ClientError::ConnectionFailed(_)
                | ClientError::ConnectionTimedOut(_)
                | ClientError::Request(_)
        );
    }
}

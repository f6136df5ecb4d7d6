use async_trait::async_trait;
use tokio::sync::mpsc;

use super::ClientError;
use super::StreamFragment;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

/// Notifications a connection pushes to its owner. Every event carries the
/// generation of the connection instance that produced it, so the owner can
/// drop events from instances it has already replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Fragment {
        generation: u64,
        fragment: StreamFragment,
    },
    Closed {
        generation: u64,
    },
}

impl ConnectionEvent {
    pub fn generation(&self) -> u64 {
        match self {
            ConnectionEvent::Fragment { generation, .. } => return *generation,
            ConnectionEvent::Closed { generation } => return *generation,
        }
    }
}

pub type FragmentHandler = mpsc::UnboundedSender<ConnectionEvent>;

#[async_trait]
pub trait StreamConnection: Send {
    /// Generation this instance was created with.
    fn generation(&self) -> u64;

    fn state(&self) -> ConnectionState;

    /// Registers where decoded fragments are delivered. Fragments are
    /// delivered one at a time, in arrival order.
    fn on_fragment(&mut self, handler: FragmentHandler);

    /// Resolves once the transport is ready to send. Fails immediately with
    /// `Unauthenticated` when no token is held, without touching the network.
    async fn connect(&mut self, thread_id: &str) -> Result<(), ClientError>;

    /// Transmits one user turn. Returns `false` without sending when the
    /// connection is not open. Never touches the message list.
    fn send(&mut self, content: &str, persona_id: &str) -> bool;

    /// Idempotent. Safe before `connect` and after the peer went away.
    fn disconnect(&mut self);
}

pub trait Connector: Send + Sync {
    type Connection: StreamConnection;

    fn create(&self, generation: u64) -> Self::Connection;
}

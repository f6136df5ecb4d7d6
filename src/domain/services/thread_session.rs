#[cfg(test)]
#[path = "thread_session_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::MessageReducer;
use super::ReduceOutcome;
use crate::domain::models::ChatMessage;
use crate::domain::models::ClientError;
use crate::domain::models::ConnectionEvent;
use crate::domain::models::ConnectionState;
use crate::domain::models::Connector;
use crate::domain::models::StreamConnection;
use crate::domain::models::ThreadProvisioner;

/// Change notifications for whoever renders the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    MessagesChanged,
    TurnCompleted,
    TurnFailed(String),
    ConnectionLost,
}

struct SessionInner<C> {
    state: ConnectionState,
    generation: u64,
    persona_id: Option<String>,
    thread_id: Option<String>,
    attempt: Option<CancellationToken>,
    connection: Option<C>,
    reducer: MessageReducer,
}

/// Chat controller for a single persona. Provisions a thread, owns the one
/// connection bound to it, and folds what arrives into the message list.
///
/// A session is single-use: once closed it stays closed.
pub struct ThreadSession<C: Connector> {
    provisioner: Arc<dyn ThreadProvisioner>,
    connector: C,
    inner: Mutex<SessionInner<C::Connection>>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ConnectionEvent>>,
    shutdown: CancellationToken,
}

impl<C: Connector> ThreadSession<C> {
    pub fn new(provisioner: Arc<dyn ThreadProvisioner>, connector: C) -> ThreadSession<C> {
        let (events_tx, events_rx) = mpsc::unbounded_channel::<ConnectionEvent>();

        return ThreadSession {
            provisioner,
            connector,
            inner: Mutex::new(SessionInner {
                state: ConnectionState::Idle,
                generation: 0,
                persona_id: None,
                thread_id: None,
                attempt: None,
                connection: None,
                reducer: MessageReducer::new(),
            }),
            events_tx,
            events_rx: tokio::sync::Mutex::new(events_rx),
            shutdown: CancellationToken::new(),
        };
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner<C::Connection>> {
        return self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| return poisoned.into_inner());
    }

    pub fn state(&self) -> ConnectionState {
        return self.lock().state;
    }

    pub fn generation(&self) -> u64 {
        return self.lock().generation;
    }

    pub fn persona_id(&self) -> Option<String> {
        return self.lock().persona_id.clone();
    }

    pub fn thread_id(&self) -> Option<String> {
        return self.lock().thread_id.clone();
    }

    pub fn is_streaming(&self) -> bool {
        return self.lock().reducer.is_streaming();
    }

    /// Whether `send` would currently be accepted for non-empty text.
    pub fn can_send(&self) -> bool {
        let inner = self.lock();
        return inner.state == ConnectionState::Open
            && !inner.reducer.is_streaming()
            && inner
                .connection
                .as_ref()
                .map(|conn| return conn.state() == ConnectionState::Open)
                .unwrap_or(false);
    }

    /// Snapshot of the message list.
    pub fn messages(&self) -> Vec<ChatMessage> {
        return self.lock().reducer.messages().to_vec();
    }

    /// Provisions a thread for the persona, then connects to it. On failure
    /// the session returns to Idle and `open` may be called again. A `close`
    /// that lands while this is in flight wins: the attempt is abandoned and
    /// `Superseded` is returned.
    pub async fn open(&self, persona_id: &str) -> Result<(), ClientError> {
        let (generation, attempt) = {
            let mut inner = self.lock();
            match inner.state {
                ConnectionState::Closed => return Err(ClientError::SessionClosed),
                ConnectionState::Connecting | ConnectionState::Open => {
                    return Err(ClientError::AlreadyOpen)
                }
                ConnectionState::Idle => {}
            }

            inner.generation += 1;
            let attempt = CancellationToken::new();
            inner.attempt = Some(attempt.clone());
            inner.state = ConnectionState::Connecting;
            inner.persona_id = Some(persona_id.to_string());

            (inner.generation, attempt)
        };

        tracing::debug!(persona_id, generation, "Opening thread session");

        let thread_res = tokio::select! {
            _ = attempt.cancelled() => return Err(ClientError::Superseded),
            res = self.provisioner.create_thread(persona_id) => res,
        };
        let thread = match thread_res {
            Ok(thread) => thread,
            Err(err) => {
                tracing::warn!(persona_id, error = ?err, "Thread creation failed");
                self.fail_attempt(generation);
                return Err(err);
            }
        };

        let mut connection = self.connector.create(generation);
        connection.on_fragment(self.events_tx.clone());

        let connect_res = tokio::select! {
            _ = attempt.cancelled() => Err(ClientError::Superseded),
            res = connection.connect(&thread.id) => res,
        };
        if let Err(err) = connect_res {
            connection.disconnect();
            if err != ClientError::Superseded {
                tracing::warn!(thread_id = %thread.id, error = ?err, "Connecting to thread failed");
                self.fail_attempt(generation);
            }
            return Err(err);
        }

        let mut inner = self.lock();
        if inner.generation != generation || attempt.is_cancelled() {
            drop(inner);
            connection.disconnect();
            return Err(ClientError::Superseded);
        }

        tracing::debug!(thread_id = %thread.id, generation, "Thread session open");
        inner.thread_id = Some(thread.id);
        inner.connection = Some(connection);
        inner.attempt = None;
        inner.state = ConnectionState::Open;

        return Ok(());
    }

    fn fail_attempt(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == ConnectionState::Connecting {
            inner.state = ConnectionState::Idle;
            inner.attempt = None;
        }
    }

    /// Sends one user turn. Returns `false` without touching the message list
    /// when the text is blank, a turn is still streaming, or the thread is not
    /// open.
    pub fn send(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let mut inner = self.lock();
        if inner.state != ConnectionState::Open || inner.reducer.is_streaming() {
            return false;
        }

        let persona_id = match &inner.persona_id {
            Some(persona_id) => persona_id.to_string(),
            None => return false,
        };

        let session = &mut *inner;
        let connection = match session.connection.as_mut() {
            Some(connection) if connection.state() == ConnectionState::Open => connection,
            _ => return false,
        };

        session.reducer.begin_turn(text);
        if !connection.send(text, &persona_id) {
            tracing::warn!(persona_id = %persona_id, "Connection refused the message");
            session.reducer.interrupt();
            return false;
        }

        return true;
    }

    /// Tears the session down. Safe from any state and safe to repeat.
    pub fn close(&self) {
        let connection = {
            let mut inner = self.lock();
            if inner.state == ConnectionState::Closed {
                return;
            }

            inner.generation += 1;
            if let Some(attempt) = inner.attempt.take() {
                attempt.cancel();
            }
            inner.state = ConnectionState::Closed;
            inner.reducer.interrupt();

            inner.connection.take()
        };

        self.shutdown.cancel();
        if let Some(mut connection) = connection {
            connection.disconnect();
        }

        tracing::debug!("Thread session closed");
    }

    /// Applies one connection event. Events from a connection instance other
    /// than the current one are dropped.
    pub fn handle_event(&self, event: ConnectionEvent) -> Option<SessionUpdate> {
        let mut inner = self.lock();
        if event.generation() != inner.generation || inner.state != ConnectionState::Open {
            tracing::debug!(
                event_generation = event.generation(),
                generation = inner.generation,
                "Dropping stale connection event"
            );
            return None;
        }

        match event {
            ConnectionEvent::Fragment { fragment, .. } => match inner.reducer.apply(&fragment) {
                ReduceOutcome::Ignored => return None,
                ReduceOutcome::Updated => return Some(SessionUpdate::MessagesChanged),
                ReduceOutcome::Sealed(_) => return Some(SessionUpdate::TurnCompleted),
                ReduceOutcome::Failed(message) => return Some(SessionUpdate::TurnFailed(message)),
            },
            ConnectionEvent::Closed { .. } => {
                tracing::warn!(thread_id = ?inner.thread_id, "Connection closed by peer");
                inner.reducer.interrupt();
                return Some(SessionUpdate::ConnectionLost);
            }
        }
    }

    /// Waits for the next event that changes what the UI should show.
    /// Returns `None` once the session is closed.
    pub async fn next_update(&self) -> Option<SessionUpdate> {
        let mut events_rx = self.events_rx.lock().await;
        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => return None,
                event = events_rx.recv() => event?,
            };

            if let Some(update) = self.handle_event(event) {
                return Some(update);
            }
        }
    }
}

impl<C: Connector> Drop for ThreadSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}

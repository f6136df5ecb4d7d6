#[cfg(test)]
#[path = "websocket_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use futures::SinkExt;
use futures::StreamExt;
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ClientError;
use crate::domain::models::ConnectionEvent;
use crate::domain::models::ConnectionState;
use crate::domain::models::Connector;
use crate::domain::models::FragmentHandler;
use crate::domain::models::OutgoingFrame;
use crate::domain::models::StreamConnection;
use crate::domain::models::StreamFragment;

fn convert_err(err: tungstenite::Error) -> ClientError {
    if let tungstenite::Error::Http(res) = &err {
        let status = res.status().as_u16();
        if status == 401 || status == 403 {
            return ClientError::Unauthenticated;
        }
    }

    return ClientError::ConnectionFailed(err.to_string());
}

/// `{base}/ws/chat/{thread_id}?token=...`. The token goes in the query
/// because the handshake can't carry an auth header in every client.
/// Saturates instead of wrapping for durations past `u64::MAX` milliseconds.
fn timeout_millis(timeout: Duration) -> u64 {
    return u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
}

pub fn chat_url(base_url: &str, thread_id: &str, token: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(&format!(
        "{}/ws/chat/{thread_id}",
        base_url.trim_end_matches('/')
    ))
    .map_err(|err| return ClientError::InvalidUrl(err.to_string()))?;
    url.query_pairs_mut().append_pair("token", token);

    return Ok(url);
}

/// One WebSocket bound to one chat thread. Instances are single-use:
/// after a failed `connect` or a `disconnect`, create a new one.
pub struct WebSocketConnection {
    base_url: String,
    token: String,
    connect_timeout: Duration,
    generation: u64,
    state: Arc<RwLock<ConnectionState>>,
    handler: Option<FragmentHandler>,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    cancel: CancellationToken,
}

impl WebSocketConnection {
    fn set_state(&self, state: ConnectionState) {
        set_state(&self.state, state);
    }
}

fn set_state(lock: &RwLock<ConnectionState>, state: ConnectionState) {
    let mut current = lock
        .write()
        .unwrap_or_else(|poisoned| return poisoned.into_inner());
    *current = state;
}

#[async_trait]
impl StreamConnection for WebSocketConnection {
    fn generation(&self) -> u64 {
        return self.generation;
    }

    fn state(&self) -> ConnectionState {
        return *self
            .state
            .read()
            .unwrap_or_else(|poisoned| return poisoned.into_inner());
    }

    fn on_fragment(&mut self, handler: FragmentHandler) {
        self.handler = Some(handler);
    }

    #[allow(clippy::implicit_return)]
    async fn connect(&mut self, thread_id: &str) -> Result<(), ClientError> {
        if self.token.is_empty() {
            return Err(ClientError::Unauthenticated);
        }
        if thread_id.is_empty() {
            return Err(ClientError::ConnectionFailed(
                "Thread id is empty".to_string(),
            ));
        }
        if self.state() != ConnectionState::Idle {
            return Err(ClientError::ConnectionFailed(format!(
                "Connection is already {}",
                self.state()
            )));
        }

        let url = chat_url(&self.base_url, thread_id, &self.token)?;
        self.set_state(ConnectionState::Connecting);
        tracing::debug!(
            thread_id,
            generation = self.generation,
            "Opening chat connection"
        );

        let res = tokio::time::timeout(
            self.connect_timeout,
            tokio_tungstenite::connect_async(url.as_str()),
        )
        .await;

        let ws_stream = match res {
            Ok(Ok((ws_stream, _))) => ws_stream,
            Ok(Err(err)) => {
                self.set_state(ConnectionState::Closed);
                tracing::warn!(thread_id, error = ?err, "Chat connection failed");
                return Err(convert_err(err));
            }
            Err(_) => {
                self.set_state(ConnectionState::Closed);
                let timeout_ms = timeout_millis(self.connect_timeout);
                tracing::warn!(thread_id, timeout_ms, "Chat connection timed out");
                return Err(ClientError::ConnectionTimedOut(timeout_ms));
            }
        };

        let (mut sink, mut stream) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        self.outbound = Some(outbound_tx);
        self.set_state(ConnectionState::Open);

        let writer_cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_cancel.cancelled() => break,
                    msg = outbound_rx.recv() => match msg {
                        Some(msg) => {
                            if let Err(err) = sink.send(msg).await {
                                tracing::warn!(error = ?err, "Failed to write chat frame");
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }

            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        });

        let reader_cancel = self.cancel.clone();
        let handler = self.handler.clone();
        let state = self.state.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    _ = reader_cancel.cancelled() => return,
                    msg = stream.next() => msg,
                };

                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let fragment = match StreamFragment::decode(&text) {
                            Ok(fragment) => fragment,
                            Err(err) => {
                                tracing::warn!(generation, error = ?err, "Dropping malformed chat frame");
                                continue;
                            }
                        };
                        if let Some(handler) = &handler {
                            let _ = handler.send(ConnectionEvent::Fragment {
                                generation,
                                fragment,
                            });
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        tracing::warn!(generation, error = ?err, "Chat connection errored");
                        break;
                    }
                }
            }

            if reader_cancel.is_cancelled() {
                return;
            }

            tracing::debug!(generation, "Chat connection closed by peer");
            set_state(&state, ConnectionState::Closed);
            reader_cancel.cancel();
            if let Some(handler) = &handler {
                let _ = handler.send(ConnectionEvent::Closed { generation });
            }
        });

        return Ok(());
    }

    fn send(&mut self, content: &str, persona_id: &str) -> bool {
        if self.state() != ConnectionState::Open {
            return false;
        }

        let outbound = match &self.outbound {
            Some(outbound) => outbound,
            None => return false,
        };

        let frame = match OutgoingFrame::new(persona_id, content).encode() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(error = ?err, "Failed to encode chat frame");
                return false;
            }
        };

        return outbound.send(Message::Text(frame)).is_ok();
    }

    fn disconnect(&mut self) {
        if self.state() != ConnectionState::Closed {
            tracing::debug!(generation = self.generation, "Closing chat connection");
        }

        self.set_state(ConnectionState::Closed);
        self.cancel.cancel();
        self.outbound = None;
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Clone, Debug)]
pub struct WebSocketConnector {
    base_url: String,
    token: String,
    connect_timeout: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> WebSocketConnector {
        let connect_timeout = Config::get(ConfigKey::ConnectTimeout)
            .parse::<u64>()
            .unwrap_or(10_000);

        return WebSocketConnector::new(
            &Config::ws_url(),
            &Config::get(ConfigKey::Token),
            Duration::from_millis(connect_timeout),
        );
    }
}

impl WebSocketConnector {
    pub fn new(base_url: &str, token: &str, connect_timeout: Duration) -> WebSocketConnector {
        return WebSocketConnector {
            base_url: base_url.to_string(),
            token: token.to_string(),
            connect_timeout,
        };
    }
}

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    fn create(&self, generation: u64) -> WebSocketConnection {
        return WebSocketConnection {
            base_url: self.base_url.to_string(),
            token: self.token.to_string(),
            connect_timeout: self.connect_timeout,
            generation,
            state: Arc::new(RwLock::new(ConnectionState::Idle)),
            handler: None,
            outbound: None,
            cancel: CancellationToken::new(),
        };
    }
}

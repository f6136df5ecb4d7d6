use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use futures::SinkExt;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::ErrorResponse;
use tokio_tungstenite::tungstenite::handshake::server::Request;
use tokio_tungstenite::tungstenite::handshake::server::Response;
use tokio_tungstenite::tungstenite::http;
use tokio_tungstenite::tungstenite::Message;

/// Reply entry that makes the server close the socket instead of sending a
/// frame.
pub const CLOSE_REPLY: &str = "<close>";

pub fn stream_frame(content: &str, done: bool) -> String {
    return serde_json::json!({ "type": "stream", "content": content, "done": done }).to_string();
}

pub fn error_frame(content: &str) -> String {
    return serde_json::json!({ "type": "error", "content": content }).to_string();
}

#[derive(Default)]
struct Recorded {
    frames: Mutex<Vec<String>>,
    paths: Mutex<Vec<String>>,
    accepted: AtomicUsize,
    active: AtomicUsize,
}

/// In-process chat socket that mimics `/ws/chat/{thread_id}?token=...`.
///
/// Every text frame received from a client is recorded, then answered with
/// the scripted replies in order.
pub struct MockChatServer {
    addr: SocketAddr,
    recorded: Arc<Recorded>,
    task: JoinHandle<()>,
}

impl MockChatServer {
    pub async fn start(token: &str, replies: Vec<String>) -> MockChatServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Recorded::default());
        let expected_token = token.to_string();
        let replies = Arc::new(replies);

        let accept_recorded = recorded.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = accept_recorded.clone();
                let replies = replies.clone();
                let expected_token = expected_token.clone();

                tokio::spawn(async move {
                    let path_recorded = recorded.clone();
                    let callback = move |req: &Request, res: Response| {
                        let uri = req.uri().to_string();
                        path_recorded.paths.lock().unwrap().push(uri.clone());

                        if !uri.contains(&format!("token={expected_token}")) {
                            let rejection: ErrorResponse = http::Response::builder()
                                .status(403)
                                .body(Some("Unauthorized".to_string()))
                                .unwrap();
                            return Err(rejection);
                        }

                        return Ok(res);
                    };

                    let mut ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
                        Ok(ws) => ws,
                        Err(_) => return,
                    };
                    recorded.accepted.fetch_add(1, Ordering::SeqCst);
                    recorded.active.fetch_add(1, Ordering::SeqCst);

                    'conn: while let Some(Ok(msg)) = ws.next().await {
                        match msg {
                            Message::Text(text) => {
                                recorded.frames.lock().unwrap().push(text);
                                for reply in replies.iter() {
                                    if reply == CLOSE_REPLY {
                                        let _ = ws.close(None).await;
                                        break 'conn;
                                    }
                                    if ws.send(Message::Text(reply.to_string())).await.is_err() {
                                        break 'conn;
                                    }
                                }
                            }
                            Message::Close(_) => break,
                            _ => continue,
                        }
                    }

                    recorded.active.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        return MockChatServer {
            addr,
            recorded,
            task,
        };
    }

    pub fn url(&self) -> String {
        return format!("ws://{}", self.addr);
    }

    /// Raw text frames sent by clients, in arrival order.
    pub fn received(&self) -> Vec<String> {
        return self.recorded.frames.lock().unwrap().clone();
    }

    /// Request URIs of every handshake attempt, accepted or not.
    pub fn requested_paths(&self) -> Vec<String> {
        return self.recorded.paths.lock().unwrap().clone();
    }

    pub fn accepted_connections(&self) -> usize {
        return self.recorded.accepted.load(Ordering::SeqCst);
    }

    pub fn active_connections(&self) -> usize {
        return self.recorded.active.load(Ordering::SeqCst);
    }

    /// Polls until `active_connections` equals `expected` or a second passes.
    pub async fn wait_for_active(&self, expected: usize) -> usize {
        for _ in 0..100 {
            if self.active_connections() == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        return self.active_connections();
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Accepts TCP connections and never answers, for exercising connect
/// timeouts.
pub struct SilentServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl SilentServer {
    pub async fn start() -> SilentServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let mut held = vec![];
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        return SilentServer { addr, task };
    }

    pub fn url(&self) -> String {
        return format!("ws://{}", self.addr);
    }
}

impl Drop for SilentServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

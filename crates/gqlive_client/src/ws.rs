//! Streaming transport: subscriptions over graphql-transport-ws.
//!
//! One connection carries one subscription for the lifetime of a session;
//! re-running a literal opens a fresh transport. The connection reconnects
//! (and re-subscribes) on abnormal closure and is torn down after the
//! configured inactivity timeout.
//!
//! Protocol: <https://github.com/enisdenjo/graphql-ws/blob/master/PROTOCOL.md>

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::request::GraphQLRequest;
use crate::response::{GraphQLError, GraphQLResponse};
use crate::transport::StreamSettings;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// graphql-transport-ws message framing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsMessage {
    ConnectionInit {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    ConnectionAck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Subscribe {
        id: String,
        payload: GraphQLRequest,
    },
    Next {
        id: String,
        payload: GraphQLResponse,
    },
    Error {
        id: String,
        payload: Vec<GraphQLError>,
    },
    Complete {
        id: String,
    },
}

/// An event observed on an open subscription stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A pushed `next` payload.
    Message(GraphQLResponse),
    /// The stream failed; no further events follow.
    Failed(String),
}

/// Consumer handle for one subscription. Yields events in wire arrival
/// order; `None` means the stream closed.
pub struct SubscriptionStream {
    rx: mpsc::Receiver<StreamEvent>,
}

impl SubscriptionStream {
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

/// The persistent duplex channel used for subscriptions.
#[derive(Debug, Clone)]
pub struct StreamingTransport {
    url: String,
    headers: IndexMap<String, String>,
    settings: StreamSettings,
}

impl StreamingTransport {
    pub fn new(url: impl Into<String>, settings: StreamSettings) -> Self {
        Self {
            url: url.into(),
            headers: IndexMap::new(),
            settings,
        }
    }

    pub fn with_headers(mut self, headers: IndexMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Dials the endpoint, subscribes, and hands back the event stream.
    ///
    /// Setup failures (bad URL, refused connection, handshake failure)
    /// surface here; once the stream is returned, failures arrive as
    /// [`StreamEvent::Failed`].
    pub async fn open(self, request: GraphQLRequest) -> ClientResult<SubscriptionStream> {
        let parsed = url::Url::parse(&self.url)?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(ClientError::InvalidUrl(format!(
                "unsupported scheme `{}` for a streaming endpoint",
                parsed.scheme()
            )));
        }

        let socket = self.connect().await?;
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(self.drive(socket, request, tx));
        Ok(SubscriptionStream { rx })
    }

    async fn connect(&self) -> ClientResult<WsStream> {
        let mut ws_request = self.url.as_str().into_client_request()?;
        ws_request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static("graphql-transport-ws"),
        );
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::WebSocket(e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::WebSocket(e.to_string()))?;
            ws_request.headers_mut().insert(name, value);
        }

        let (socket, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(ws_request))
            .await
            .map_err(|_| ClientError::Timeout)??;
        Ok(socket)
    }

    async fn drive(
        self,
        mut socket: WsStream,
        request: GraphQLRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) {
        loop {
            let outcome = run_connection(
                &mut socket,
                &request,
                &tx,
                self.settings.inactivity_timeout,
            )
            .await;

            match outcome {
                ConnectionOutcome::Finished | ConnectionOutcome::Idle => break,
                ConnectionOutcome::Dropped(reason) => {
                    if tx.is_closed() {
                        break;
                    }
                    if !self.settings.reconnect {
                        let _ = tx.send(StreamEvent::Failed(reason)).await;
                        break;
                    }
                    debug!(reason = %reason, url = %self.url, "stream dropped, reconnecting");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    match self.connect().await {
                        Ok(next_socket) => socket = next_socket,
                        Err(err) => {
                            let _ = tx.send(StreamEvent::Failed(err.to_string())).await;
                            break;
                        }
                    }
                }
            }
        }
    }
}

enum ConnectionOutcome {
    /// The server completed or errored the operation, or the consumer
    /// went away; nothing left to do.
    Finished,
    /// The inactivity timeout elapsed; the connection was torn down.
    Idle,
    /// The connection dropped mid-stream.
    Dropped(String),
}

/// Runs one connection through handshake, subscribe and the read loop.
async fn run_connection(
    socket: &mut WsStream,
    request: &GraphQLRequest,
    tx: &mpsc::Sender<StreamEvent>,
    inactivity: Duration,
) -> ConnectionOutcome {
    if let Err(err) = handshake(socket, request).await {
        return ConnectionOutcome::Dropped(err.to_string());
    }

    loop {
        let frame = match tokio::time::timeout(inactivity, socket.next()).await {
            Err(_) => {
                debug!("inactivity timeout reached, tearing down stream");
                let _ = socket.close(None).await;
                return ConnectionOutcome::Idle;
            }
            Ok(None) => return ConnectionOutcome::Dropped("connection closed".into()),
            Ok(Some(Err(err))) => return ConnectionOutcome::Dropped(err.to_string()),
            Ok(Some(Ok(frame))) => frame,
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => {
                return ConnectionOutcome::Dropped("connection closed".into())
            }
            _ => continue,
        };

        // Unknown or malformed frames are ignored; the protocol allows
        // forward-compatible extensions.
        let Ok(message) = serde_json::from_str::<WsMessage>(&text) else {
            continue;
        };

        match message {
            WsMessage::Next { payload, .. } => {
                if tx.send(StreamEvent::Message(payload)).await.is_err() {
                    let _ = socket.close(None).await;
                    return ConnectionOutcome::Finished;
                }
            }
            WsMessage::Error { payload, .. } => {
                let reason = payload
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                let reason = if reason.is_empty() {
                    "subscription error".to_string()
                } else {
                    reason
                };
                let _ = tx.send(StreamEvent::Failed(reason)).await;
                let _ = socket.close(None).await;
                return ConnectionOutcome::Finished;
            }
            WsMessage::Complete { .. } => {
                let _ = socket.close(None).await;
                return ConnectionOutcome::Finished;
            }
            WsMessage::Ping { payload } => {
                if let Err(err) = send(socket, &WsMessage::Pong { payload }).await {
                    return ConnectionOutcome::Dropped(err.to_string());
                }
            }
            _ => {}
        }
    }
}

/// connection_init, await connection_ack, subscribe.
async fn handshake(socket: &mut WsStream, request: &GraphQLRequest) -> ClientResult<()> {
    send(socket, &WsMessage::ConnectionInit { payload: None }).await?;

    loop {
        let frame = tokio::time::timeout(CONNECT_TIMEOUT, socket.next())
            .await
            .map_err(|_| ClientError::Timeout)?
            .ok_or_else(|| ClientError::Protocol("closed before connection_ack".into()))?
            .map_err(ClientError::from)?;

        let Message::Text(text) = frame else {
            continue;
        };
        match serde_json::from_str::<WsMessage>(&text) {
            Ok(WsMessage::ConnectionAck { .. }) => break,
            Ok(WsMessage::Ping { payload }) => {
                send(socket, &WsMessage::Pong { payload }).await?;
            }
            _ => {}
        }
    }

    send(
        socket,
        &WsMessage::Subscribe {
            id: "1".to_string(),
            payload: request.clone(),
        },
    )
    .await
}

async fn send(socket: &mut WsStream, message: &WsMessage) -> ClientResult<()> {
    let json = serde_json::to_string(message)?;
    socket.send(Message::Text(json.into())).await?;
    Ok(())
}

//! Error types for the wire layer.

use thiserror::Error;

/// Transport setup and protocol errors.
///
/// Everything here is caught at the executor boundary and converted into
/// one error-formatted callback invocation; nothing above the executor
/// ever sees these as raw errors.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The endpoint URL could not be parsed or has an unusable scheme.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
    /// Connection refused or failed.
    #[error("connection error: {0}")]
    Connection(String),
    /// The request or handshake timed out.
    #[error("request timed out")]
    Timeout,
    /// HTTP request failed, including non-success status codes.
    #[error("request error: {0}")]
    Request(String),
    /// WebSocket transport failure.
    #[error("websocket error: {0}")]
    WebSocket(String),
    /// Body (de)serialization failure.
    #[error("json error: {0}")]
    Json(String),
    /// The peer violated the graphql-transport-ws protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Json(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(err.to_string())
    }
}

/// Type alias for wire-layer results.
pub type ClientResult<T> = Result<T, ClientError>;

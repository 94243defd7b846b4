//! Transport selection.

use std::time::Duration;

use gqlive_core::OperationKind;

/// The two delivery models an operation can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Request/response over HTTP; exactly one result.
    OneShot,
    /// Persistent duplex channel; zero or more pushed results.
    Streaming,
}

impl Transport {
    /// Pure function from operation kind to transport choice.
    pub const fn for_kind(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Subscription => Self::Streaming,
            OperationKind::Query | OperationKind::Mutation => Self::OneShot,
        }
    }
}

/// Derives the streaming endpoint from the one-shot endpoint by rewriting
/// the scheme prefix; no other part of the URL changes.
pub fn streaming_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        url.to_string()
    }
}

/// Streaming transport policies. These are transport-level, not
/// operation-level: every stream opened with these settings reconnects on
/// abnormal closure and is torn down after the inactivity timeout.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Reconnect (and re-subscribe) when the connection drops.
    pub reconnect: bool,
    /// Tear down a connection that has been idle this long.
    pub inactivity_timeout: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            reconnect: true,
            inactivity_timeout: Duration::from_secs(30),
        }
    }
}

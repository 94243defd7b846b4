//! The operation executor.
//!
//! Runs exactly one logical operation over the transport its kind selects
//! and delivers results through a single `(text, kind)` callback. Every
//! failure path, transport or server-reported, ends in exactly one
//! error-formatted invocation; no error ever escapes to the caller.

use tracing::{debug, info, warn};

use gqlive_core::{EndpointDescriptor, OperationKind, OperationLiteral, VariableValues};

use crate::http::OneShotTransport;
use crate::request::GraphQLRequest;
use crate::transport::{streaming_url, StreamSettings, Transport};
use crate::ws::{StreamEvent, StreamingTransport};

/// Executes operations and feeds results to a callback.
#[derive(Debug, Clone, Default)]
pub struct OperationExecutor {
    oneshot: OneShotTransport,
    settings: StreamSettings,
}

impl OperationExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: StreamSettings) -> Self {
        Self {
            oneshot: OneShotTransport::new(),
            settings,
        }
    }

    /// Executes one operation.
    ///
    /// Query/mutation: exactly one callback invocation on completion.
    /// Subscription: the call returns once the stream is established (or
    /// failed to establish); a spawned forwarder then invokes the callback
    /// once per pushed message until the stream closes. Stream closure is
    /// silent; a stream failure produces one error-formatted invocation.
    pub async fn execute<F>(
        &self,
        endpoint: &EndpointDescriptor,
        literal: &OperationLiteral,
        variables: VariableValues,
        on_result: F,
    ) where
        F: Fn(String, OperationKind) + Send + Sync + 'static,
    {
        let kind = literal.kind();
        let Some(url) = endpoint.first_url() else {
            on_result(
                format!("endpoint `{}` has no URL configured", endpoint.name()),
                kind,
            );
            return;
        };

        info!(operation = %kind, endpoint = %url, "dispatching operation");
        let request = GraphQLRequest::from_literal(literal, &variables);

        match Transport::for_kind(kind) {
            Transport::OneShot => {
                match self.oneshot.post(url, &request, endpoint.headers()).await {
                    Ok(response) => {
                        if response.has_errors() || response.has_embedded_error() {
                            warn!(operation = %kind, "server reported operation failure");
                            on_result(response.failure_text(), kind);
                        } else {
                            debug!(operation = %kind, "operation completed");
                            on_result(response.format_payload(), kind);
                        }
                    }
                    Err(err) => {
                        warn!(operation = %kind, error = %err, "operation failed");
                        on_result(err.to_string(), kind);
                    }
                }
            }
            Transport::Streaming => {
                let ws_url = streaming_url(url);
                let transport = StreamingTransport::new(ws_url, self.settings.clone())
                    .with_headers(endpoint.headers().clone());
                match transport.open(request).await {
                    Ok(mut stream) => {
                        tokio::spawn(async move {
                            while let Some(event) = stream.next().await {
                                match event {
                                    StreamEvent::Message(response) => {
                                        on_result(response.format_payload(), kind);
                                    }
                                    StreamEvent::Failed(reason) => {
                                        warn!(operation = %kind, error = %reason, "stream failed");
                                        on_result(reason, kind);
                                        break;
                                    }
                                }
                            }
                            debug!(operation = %kind, "stream closed");
                        });
                    }
                    Err(err) => {
                        warn!(operation = %kind, error = %err, "stream setup failed");
                        on_result(err.to_string(), kind);
                    }
                }
            }
        }
    }
}

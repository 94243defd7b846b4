//! One execution session, end to end.
//!
//! A session owns the control flow the dispatcher promises its host:
//! resolve the workspace configuration to an endpoint, pick one of the
//! configured endpoints (asking the prompter when several are named),
//! collect variable values, then execute the operation with the result
//! sink as the callback. Every failure path lands in the sink as
//! human-readable text; `run` never panics and never returns an error.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use gqlive_client::{OperationExecutor, StreamSettings};
use gqlive_core::{EndpointDescriptor, OperationLiteral};

use crate::capabilities::{Prompter, Renderer};
use crate::config::{self, ConfigError};
use crate::sink::ResultSink;
use crate::variables::{VariableCollector, DEFAULT_SETTLE_DELAY};

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Settle delay before the first variable prompt.
    pub settle_delay: Duration,
    /// Streaming transport policies for subscription operations.
    pub stream: StreamSettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            stream: StreamSettings::default(),
        }
    }
}

/// How a session ended, for exit-code purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The operation was dispatched; results arrive in the sink. For a
    /// subscription the stream may still be live when this is returned.
    Executed,
    /// Configuration resolution failed; the error text is the complete
    /// buffer content and the executor was never invoked.
    ConfigFailed,
}

impl SessionOutcome {
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::ConfigFailed)
    }
}

/// Ties one operation literal to one execution.
///
/// Re-running a literal means constructing a fresh session: the sink and
/// any streaming transport belong to exactly one run, and a prior open
/// stream is abandoned to the transport when its session is dropped.
pub struct OperationSession {
    workspace_root: PathBuf,
    literal: OperationLiteral,
    prompter: Arc<dyn Prompter>,
    sink: Arc<ResultSink>,
    options: SessionOptions,
}

impl OperationSession {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        literal: OperationLiteral,
        prompter: Arc<dyn Prompter>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let document = literal.source().display().to_string();
        Self {
            workspace_root: workspace_root.into(),
            literal,
            prompter,
            sink: Arc::new(ResultSink::new(document, renderer)),
            options: SessionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// The sink accumulating this session's results.
    pub fn sink(&self) -> &Arc<ResultSink> {
        &self.sink
    }

    /// The literal this session executes.
    pub fn literal(&self) -> &OperationLiteral {
        &self.literal
    }

    /// Runs the session to the point where results flow into the sink.
    ///
    /// Queries and mutations have delivered their single increment when
    /// this returns; a subscription has an established stream feeding the
    /// sink until it closes.
    pub async fn run(&self) -> SessionOutcome {
        let endpoint = match self.resolve_endpoint().await {
            Ok(endpoint) => endpoint,
            Err(err) => {
                self.sink.append_increment(&err.to_string(), self.literal.kind());
                return SessionOutcome::ConfigFailed;
            }
        };

        let collector = VariableCollector::new(Arc::clone(&self.prompter))
            .with_settle_delay(self.options.settle_delay);
        let variables = collector.collect(self.literal.variable_declarations()).await;

        let sink = Arc::clone(&self.sink);
        OperationExecutor::with_settings(self.options.stream.clone())
            .execute(&endpoint, &self.literal, variables, move |text, kind| {
                sink.append_increment(&text, kind);
            })
            .await;
        SessionOutcome::Executed
    }

    async fn resolve_endpoint(&self) -> Result<EndpointDescriptor, ConfigError> {
        let resolved = config::resolve(&self.workspace_root, self.literal.source())?;
        if resolved.matched.is_fallback() {
            warn!(
                source = %self.literal.source().display(),
                project = %resolved.name,
                "no project patterns matched; using the first declared project"
            );
        }

        let names = resolved.endpoint_names();
        let chosen = if names.len() > 1 {
            self.prompter
                .select("Select an endpoint", &names)
                .await
        } else {
            None
        };

        let endpoint = resolved.endpoint(chosen.as_deref())?;
        info!(
            project = %resolved.name,
            endpoint = %endpoint.name(),
            "resolved execution endpoint"
        );
        Ok(endpoint)
    }
}

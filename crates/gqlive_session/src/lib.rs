//! Session orchestration for gqlive.
//!
//! A session ties one operation literal to one execution: it resolves the
//! workspace configuration to an endpoint, collects variable values
//! through an interactive prompter, executes the operation, and
//! accumulates every result increment in a live document buffer that is
//! re-rendered after each mutation.
//!
//! The host surfaces (prompting, rendering) are injected through the
//! [`Prompter`] and [`Renderer`] capability traits so the whole flow runs
//! without any host runtime in tests.

pub mod capabilities;
pub mod config;
pub mod session;
pub mod sink;
pub mod variables;

pub use capabilities::{Prompter, Renderer};
pub use config::{ConfigError, GraphQLConfig, Match, ProjectConfig, ResolvedProject};
pub use session::{OperationSession, SessionOptions, SessionOutcome};
pub use sink::ResultSink;
pub use variables::VariableCollector;

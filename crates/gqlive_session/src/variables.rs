//! Interactive variable collection.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use gqlive_core::{ScalarKind, VariableDeclaration, VariableValues};

use crate::capabilities::Prompter;

/// Default settle delay before the first prompt, giving the host UI time
/// to come up. A UX accommodation, not a correctness requirement.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Collects one typed value per variable declaration through the prompter.
pub struct VariableCollector {
    prompter: Arc<dyn Prompter>,
    settle_delay: Duration,
}

impl VariableCollector {
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self {
            prompter,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Overrides the settle delay; `Duration::ZERO` disables it.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Produces exactly one entry per declaration, keyed by name, in
    /// declaration order. An empty declaration list short-circuits to an
    /// empty map without prompting and without the settle delay.
    pub async fn collect(&self, declarations: &[VariableDeclaration]) -> VariableValues {
        let mut values = VariableValues::new();
        if declarations.is_empty() {
            return values;
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        for declaration in declarations {
            let input = self
                .prompter
                .prompt(&format!(
                    "Please enter the value for {}",
                    declaration.name
                ))
                .await;
            if input.is_none() {
                debug!(variable = %declaration.name, "prompt dismissed, using null");
            }
            values.insert(declaration.name.clone(), cast_input(&declaration.ty, input));
        }
        values
    }
}

/// Casts raw prompt text to the declared scalar type.
///
/// Deterministic by contract: numeric kinds parse or fall back to null,
/// booleans accept `true`/`1`/`yes` case-insensitively, text kinds keep
/// the raw input, and a dismissed prompt is null for every kind.
pub fn cast_input(ty: &ScalarKind, input: Option<String>) -> Value {
    let Some(raw) = input else {
        return Value::Null;
    };
    match ty {
        ScalarKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::Null),
        ScalarKind::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or(Value::Null),
        ScalarKind::Boolean => {
            let normalized = raw.trim().to_ascii_lowercase();
            Value::Bool(matches!(normalized.as_str(), "true" | "1" | "yes"))
        }
        ScalarKind::Id | ScalarKind::String | ScalarKind::Other(_) => Value::String(raw),
    }
}

//! GraphQL-over-HTTP request bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use gqlive_core::{OperationLiteral, VariableValues};

/// The standard GraphQL request envelope, shared by the one-shot body and
/// the `subscribe` payload of the streaming protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLRequest {
    /// The operation text, sent verbatim.
    pub query: String,

    /// Variable values collected for this execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,

    /// Operation name, for documents that declare one.
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    /// Builds the wire body for a literal and its collected variables.
    ///
    /// An empty variable map serializes as an absent `variables` field.
    pub fn from_literal(literal: &OperationLiteral, variables: &VariableValues) -> Self {
        let variables = if variables.is_empty() {
            None
        } else {
            Some(Value::Object(
                variables
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ))
        };
        Self {
            query: literal.text().to_string(),
            variables,
            operation_name: literal.document().name.clone(),
        }
    }
}

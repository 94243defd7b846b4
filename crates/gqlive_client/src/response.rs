//! GraphQL response envelope and result formatting.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// An error entry from the response's `errors` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// The `{data, errors}` envelope of a GraphQL response, for both the
/// one-shot body and each streamed `next` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<Value>,

    /// Servers send an absent key, an explicit `null`, or a list; all
    /// three decode, with null and absent as the empty list.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub errors: Vec<GraphQLError>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<GraphQLError>, D::Error>
where
    D: Deserializer<'de>,
{
    let errors = Option::<Vec<GraphQLError>>::deserialize(deserializer)?;
    Ok(errors.unwrap_or_default())
}

impl GraphQLResponse {
    /// True when the server reported errors through the error channel.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when an error-shaped payload arrived through the data channel.
    ///
    /// Guard preserved from the original dispatcher: a data payload whose
    /// serialization contains the token `Error` is treated as a failure
    /// even when the error list is empty.
    pub fn has_embedded_error(&self) -> bool {
        match &self.data {
            Some(data) => data.to_string().contains("Error"),
            None => false,
        }
    }

    /// All error messages joined into one line.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(
                self.errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
    }

    /// The stable success serialization: a pretty-printed object holding
    /// the `data` and `errors` fields, deterministic field order,
    /// byte-identical for identical payloads.
    pub fn format_payload(&self) -> String {
        let errors = if self.errors.is_empty() {
            Value::Null
        } else {
            serde_json::to_value(&self.errors).unwrap_or(Value::Null)
        };
        let payload = serde_json::json!({
            "data": self.data,
            "errors": errors,
        });
        serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
    }

    /// The failure text the executor emits for a server-reported failure:
    /// the joined error messages when present, otherwise the raw data
    /// payload that tripped the embedded-error guard.
    pub fn failure_text(&self) -> String {
        match self.error_message() {
            Some(message) => message,
            None => self
                .data
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_else(|| "empty response".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(data: Value) -> GraphQLResponse {
        GraphQLResponse {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    #[test]
    fn formatting_is_idempotent() {
        let resp = response(json!({"x": 1}));
        assert_eq!(resp.format_payload(), resp.format_payload());
    }

    #[test]
    fn format_includes_null_errors() {
        let resp = response(json!({"x": 1}));
        let text = resp.format_payload();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["data"]["x"], 1);
        assert!(value["errors"].is_null());
        // Pretty-printed, not compact.
        assert!(text.contains('\n'));
    }

    #[test]
    fn embedded_error_guard() {
        assert!(response(json!({"result": "InternalError: boom"})).has_embedded_error());
        assert!(response(json!("Error: nope")).has_embedded_error());
        assert!(!response(json!({"result": "all good"})).has_embedded_error());
        assert!(!GraphQLResponse::default().has_embedded_error());
    }

    #[test]
    fn error_messages_join() {
        let resp = GraphQLResponse {
            data: None,
            errors: vec![
                GraphQLError {
                    message: "first".into(),
                    locations: Vec::new(),
                    path: None,
                    extensions: None,
                },
                GraphQLError {
                    message: "second".into(),
                    locations: Vec::new(),
                    path: None,
                    extensions: None,
                },
            ],
        };
        assert_eq!(resp.error_message().as_deref(), Some("first; second"));
        assert_eq!(resp.failure_text(), "first; second");
    }

    #[test]
    fn failure_text_falls_back_to_data() {
        let resp = response(json!({"status": "Error"}));
        assert_eq!(resp.failure_text(), r#"{"status":"Error"}"#);
    }

    #[test]
    fn deserializes_wire_shapes() {
        let resp: GraphQLResponse =
            serde_json::from_str(r#"{"data":{"x":1}}"#).unwrap();
        assert!(!resp.has_errors());

        let resp: GraphQLResponse =
            serde_json::from_str(r#"{"data":null,"errors":[{"message":"boom"}]}"#).unwrap();
        assert!(resp.has_errors());
    }

    #[test]
    fn explicit_null_errors_is_the_empty_list() {
        let resp: GraphQLResponse =
            serde_json::from_str(r#"{"data":{"x":1},"errors":null}"#).unwrap();
        assert!(!resp.has_errors());
        assert_eq!(resp.error_message(), None);
        assert_eq!(resp.data, Some(json!({"x": 1})));
    }
}

//! One-shot transport: GraphQL over HTTP request/response.

use indexmap::IndexMap;

use crate::error::{ClientError, ClientResult};
use crate::request::GraphQLRequest;
use crate::response::GraphQLResponse;

/// The request/response channel used for queries and mutations.
#[derive(Debug, Clone, Default)]
pub struct OneShotTransport {
    client: reqwest::Client,
}

impl OneShotTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// POSTs the request body and decodes the `{data, errors}` envelope.
    ///
    /// Non-success HTTP statuses are errors at this layer; GraphQL-level
    /// errors travel inside the decoded envelope and are judged by the
    /// executor.
    pub async fn post(
        &self,
        url: &str,
        request: &GraphQLRequest,
        headers: &IndexMap<String, String>,
    ) -> ClientResult<GraphQLResponse> {
        let parsed = url::Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "unsupported scheme `{}`",
                parsed.scheme()
            )));
        }

        let mut req = self
            .client
            .post(parsed)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let response = req.json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Request(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let envelope = response.json::<GraphQLResponse>().await?;
        Ok(envelope)
    }
}

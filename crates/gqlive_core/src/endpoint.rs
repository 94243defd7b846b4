//! Resolved endpoint descriptors.

use indexmap::IndexMap;

/// Candidate URLs for a resolved project, plus any static headers the
/// workspace configuration attaches to them. The executor always uses the
/// first candidate. Lives for one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    name: String,
    urls: Vec<String>,
    headers: IndexMap<String, String>,
}

impl EndpointDescriptor {
    pub fn new(name: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            name: name.into(),
            urls,
            headers: IndexMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: IndexMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// The endpoint's configured name (`default` for anonymous endpoints).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All candidate URLs in declaration order.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// The active candidate.
    pub fn first_url(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }

    /// Static headers sent with every request to this endpoint.
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }
}

//! Caller supplied request description

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single fetch request as supplied by the configuration layer
///
/// The method is kept as the caller wrote it; it is checked against the
/// allow-list by the executor before any I/O happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    request_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_body: Option<String>,
}

impl RequestSpec {
    /// Create a `GET` request for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the request method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Add a request header, replacing an existing entry with the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    /// Replace all request headers
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request_headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Method as supplied, `None` meaning the default
    pub fn method_name(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Request headers
    pub fn request_headers(&self) -> &BTreeMap<String, String> {
        &self.request_headers
    }

    /// Request body, if any
    pub fn request_body(&self) -> Option<&str> {
        self.request_body.as_deref()
    }
}

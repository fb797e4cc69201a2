//! Normalized response record and its output form

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized result of a successful fetch
///
/// Built once, after the whole body has been read, and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    id: String,
    status_code: u16,
    response_body: String,
    response_headers: BTreeMap<String, String>,
}

impl ResponseRecord {
    pub(crate) fn new(
        url: &str,
        status_code: u16,
        response_body: String,
        response_headers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: url.to_string(),
            status_code,
            response_body,
            response_headers,
        }
    }

    /// Identifier of the fetched resource (the requested URL)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// HTTP status code as received
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Body decoded as UTF-8
    pub fn response_body(&self) -> &str {
        &self.response_body
    }

    /// Flattened response headers keyed by canonical name
    pub fn response_headers(&self) -> &BTreeMap<String, String> {
        &self.response_headers
    }

    /// Flattened value of one response header, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response_headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Map to the output contract, adding the deprecated `body` alias
    pub fn to_state(&self) -> ResponseState {
        ResponseState {
            id: self.id.clone(),
            status_code: self.status_code,
            response_body: self.response_body.clone(),
            response_headers: self.response_headers.clone(),
            body: self.response_body.clone(),
        }
    }
}

/// Output contract handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseState {
    /// Identifier of the fetched resource
    pub id: String,
    /// HTTP status code
    pub status_code: u16,
    /// Response body
    pub response_body: String,
    /// Flattened response headers
    pub response_headers: BTreeMap<String, String>,
    /// Deprecated: use `response_body`
    pub body: String,
}

impl From<ResponseRecord> for ResponseState {
    fn from(record: ResponseRecord) -> Self {
        ResponseState {
            body: record.response_body.clone(),
            id: record.id,
            status_code: record.status_code,
            response_body: record.response_body,
            response_headers: record.response_headers,
        }
    }
}

/// Non-fatal warning attached to a successful fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// One line summary
    pub summary: String,
    /// Longer explanation
    pub detail: String,
}

impl Advisory {
    /// Create a new advisory
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// A response record together with any advisories raised while producing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The normalized response
    pub record: ResponseRecord,
    /// Non-fatal warnings
    pub warnings: Vec<Advisory>,
}

impl FetchOutcome {
    /// True when no advisory was raised
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

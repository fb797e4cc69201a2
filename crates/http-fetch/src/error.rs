//! Fetch error types

use thiserror::Error;

use crate::method::Method;

/// Errors that abort a fetch invocation
///
/// None of these are retried internally and no partial record accompanies them.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Input rejected before any network I/O
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Request construction, network, cancellation or timeout failure
    #[error("error making request to {url}: {source}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying cause
        #[source]
        source: TransportError,
    },
    /// Non-2xx status while strict status handling is enabled
    #[error("response code from {url} is not 2xx: {status}")]
    StrictStatus {
        /// Requested URL
        url: String,
        /// Status code received
        status: u16,
    },
    /// Failure while reading the response body
    #[error("error reading response body from {url}: {source}")]
    BodyRead {
        /// Requested URL
        url: String,
        /// Underlying cause
        #[source]
        source: TransportError,
    },
}

impl FetchError {
    /// Status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::StrictStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the invocation ended because the caller cancelled it
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            FetchError::Transport {
                source: TransportError::Cancelled,
                ..
            } | FetchError::BodyRead {
                source: TransportError::Cancelled,
                ..
            }
        )
    }
}

/// Input validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Method outside the allow-list
    #[error("method {method:?} not allowed, must be one of: {}", Method::allowed_list())]
    UnsupportedMethod {
        /// Rejected method as supplied
        method: String,
    },
}

/// Transport level failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be constructed (bad URL, header name or value)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// DNS, connect or TLS handshake failure
    #[error("connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("request timeout")]
    Timeout,
    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,
    /// Other error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_connect() {
            TransportError::Connection(error_chain(&err))
        } else {
            TransportError::Other(error_chain(&err))
        }
    }
}

/// Flattens an error and its sources into one line so the root cause survives
/// conversion into a string variant.
#[cfg(feature = "reqwest")]
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<http::Error> for TransportError {
    fn from(err: http::Error) -> Self {
        TransportError::InvalidRequest(err.to_string())
    }
}

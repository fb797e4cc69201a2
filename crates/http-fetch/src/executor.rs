//! Fetch executor
//!
//! Runs the fixed pipeline for one request:
//!
//! ```text
//! Validated -> Dispatched -> ResponseReceived -> BodyRead -> Classified -> Recorded
//! ```
//!
//! Any failure ends the pipeline with the originating error; there are no loops
//! and no retries. The executor holds no mutable state, so a single instance can
//! serve concurrent invocations.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::content_type::classify;
use crate::error::{FetchError, TransportError};
use crate::headers::flatten_headers;
use crate::method::Method;
use crate::request::RequestSpec;
use crate::response::{FetchOutcome, ResponseRecord};
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// Per-executor fetch policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Treat non-2xx status codes as fatal
    pub strict_status: bool,
    /// Upper bound on dispatch plus body read
    pub timeout: Option<Duration>,
}

impl FetchPolicy {
    /// Permissive policy: any status is captured, no timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable strict status handling
    pub fn strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }

    /// Bound the whole invocation by `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Pipeline phases, logged at trace level as they complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// Method checked against the allow-list
    Validated,
    /// Request handed to the transport
    Dispatched,
    /// Status line and headers received
    ResponseReceived,
    /// Full body read into memory
    BodyRead,
    /// Content-Type classified
    Classified,
    /// Record produced
    Recorded,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Validated => write!(f, "Validated"),
            FetchPhase::Dispatched => write!(f, "Dispatched"),
            FetchPhase::ResponseReceived => write!(f, "ResponseReceived"),
            FetchPhase::BodyRead => write!(f, "BodyRead"),
            FetchPhase::Classified => write!(f, "Classified"),
            FetchPhase::Recorded => write!(f, "Recorded"),
        }
    }
}

/// Executes [`RequestSpec`]s against an injected [`Transport`]
#[derive(Debug, Clone)]
pub struct FetchExecutor<T> {
    transport: T,
    policy: FetchPolicy,
}

impl<T: Transport> FetchExecutor<T> {
    /// Create an executor with the permissive default policy
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: FetchPolicy::default(),
        }
    }

    /// Replace the policy
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current policy
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `spec` without external cancellation
    pub async fn execute(&self, spec: &RequestSpec) -> Result<FetchOutcome, FetchError> {
        self.execute_with_cancel(spec, &CancellationToken::new())
            .await
    }

    /// Execute `spec`, aborting with [`TransportError::Cancelled`] once `cancel`
    /// fires
    #[tracing::instrument(skip_all, fields(url = %spec.url()))]
    pub async fn execute_with_cancel(
        &self,
        spec: &RequestSpec,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        let url = spec.url();
        let transport_error = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let method = Method::validate(spec.method_name())?;
        phase(FetchPhase::Validated);

        let request = build_request(method, spec).map_err(transport_error)?;
        // A deadline past what `Instant` can represent means no deadline
        let deadline = self
            .policy
            .timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));

        tracing::debug!("Sending {} request", method);
        phase(FetchPhase::Dispatched);
        let response = guarded(self.transport.execute(request), cancel, deadline)
            .await
            .map_err(transport_error)?;

        let status_code = response.status();
        tracing::debug!(status_code, "Received response");
        phase(FetchPhase::ResponseReceived);

        if self.policy.strict_status && !(200..300).contains(&status_code) {
            return Err(FetchError::StrictStatus {
                url: url.to_string(),
                status: status_code,
            });
        }

        let response_headers = flatten_headers(response.headers());
        let content_type = content_type_of(response.headers());

        let body = guarded(response.bytes(), cancel, deadline)
            .await
            .map_err(|source| match source {
                TransportError::Cancelled | TransportError::Timeout => transport_error(source),
                source => FetchError::BodyRead {
                    url: url.to_string(),
                    source,
                },
            })?;
        tracing::trace!(bytes = body.len(), "Read response body");
        phase(FetchPhase::BodyRead);

        let classification = classify(content_type.as_deref());
        let warnings: Vec<_> = classification.advisory().into_iter().collect();
        for warning in &warnings {
            tracing::warn!("{}", warning.summary);
        }
        phase(FetchPhase::Classified);

        let response_body = String::from_utf8_lossy(&body).into_owned();
        let record = ResponseRecord::new(url, status_code, response_body, response_headers);
        phase(FetchPhase::Recorded);

        Ok(FetchOutcome { record, warnings })
    }
}

fn phase(phase: FetchPhase) {
    tracing::trace!(%phase, "Fetch phase complete");
}

/// Race `fut` against cancellation and the optional deadline
async fn guarded<F, R>(
    fut: F,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<R, TransportError>
where
    F: Future<Output = Result<R, TransportError>>,
{
    let bounded = async {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .unwrap_or(Err(TransportError::Timeout)),
            None => fut.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled),
        result = bounded => result,
    }
}

/// First Content-Type value, decoded lossily
fn content_type_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// Build the outgoing request; performs no I/O
fn build_request(method: Method, spec: &RequestSpec) -> Result<TransportRequest, TransportError> {
    let url = Url::parse(spec.url()).map_err(|e| {
        TransportError::InvalidRequest(format!("invalid url {:?}: {e}", spec.url()))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TransportError::InvalidRequest(format!(
            "unsupported url scheme {:?}, must be http or https",
            url.scheme()
        )));
    }

    let mut headers = HeaderMap::with_capacity(spec.request_headers().len());
    for (name, value) in spec.request_headers() {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportError::InvalidRequest(format!("invalid header name {name:?}: {e}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::InvalidRequest(format!("invalid value for header {name:?}: {e}"))
        })?;
        headers.insert(header_name, header_value);
    }

    let body = match spec.request_body() {
        Some(body) if method.permits_body() => Some(Bytes::from(body.to_owned())),
        Some(_) => {
            tracing::warn!("Ignoring request body, {} requests are sent without one", method);
            None
        }
        None => None,
    };

    let mut request = http::Request::builder()
        .method(http::Method::from(method))
        .uri(url.as_str())
        .body(body)?;
    *request.headers_mut() = headers;

    Ok(request)
}

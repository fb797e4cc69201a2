//! Transport abstraction
//!
//! The executor never talks to a concrete HTTP library. It is handed a
//! [`Transport`] which sends one request and yields one [`TransportResponse`].
//! The reqwest-backed [`HttpClient`](crate::HttpClient) is the production
//! implementation; tests substitute their own.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::HeaderMap;

use crate::error::TransportError;

/// Outgoing request; `None` body means no payload is sent
pub type TransportRequest = http::Request<Option<Bytes>>;

/// Sends a single HTTP request
pub trait Transport: Send + Sync {
    /// Response type produced by this transport
    type Response: TransportResponse;

    /// Send `request` and resolve once the status line and headers are in
    ///
    /// Dropping the returned future must abort the request.
    fn execute(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send;
}

/// A received response whose body has not been read yet
pub trait TransportResponse: Send {
    /// Status code
    fn status(&self) -> u16;

    /// Response headers, repeated names kept in arrival order
    fn headers(&self) -> &HeaderMap;

    /// Consume the response and read the whole body
    fn bytes(self) -> impl Future<Output = Result<Bytes, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    type Response = T::Response;

    fn execute(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send {
        (**self).execute(request)
    }
}

impl<T: Transport> Transport for &T {
    type Response = T::Response;

    fn execute(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send {
        (**self).execute(request)
    }
}

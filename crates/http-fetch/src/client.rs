//! reqwest-backed transport

use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;

use crate::error::{FetchError, TransportError};
use crate::executor::FetchExecutor;
use crate::request::RequestSpec;
use crate::response::FetchOutcome;
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// HTTP client wrapper
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Create a new HTTP client builder
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create an HttpClient from a reqwest::Client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl Transport for HttpClient {
    type Response = reqwest::Response;

    async fn execute(&self, request: TransportRequest) -> Result<Self::Response, TransportError> {
        let (parts, body) = request.into_parts();
        let mut builder = self
            .inner
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers);

        if let Some(body) = body {
            builder = builder.body(body);
        }

        Ok(builder.send().await?)
    }
}

impl TransportResponse for reqwest::Response {
    fn status(&self) -> u16 {
        reqwest::Response::status(self).as_u16()
    }

    fn headers(&self) -> &HeaderMap {
        reqwest::Response::headers(self)
    }

    async fn bytes(self) -> Result<Bytes, TransportError> {
        Ok(reqwest::Response::bytes(self).await?)
    }
}

/// HTTP client builder for proxy, user agent and timeout settings
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    proxy: Option<url::Url>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl HttpClientBuilder {
    /// Route all requests through a proxy
    pub fn proxy(mut self, url: url::Url) -> Self {
        self.proxy = Some(url);
        self
    }

    /// Set the `User-Agent` sent when the request does not carry one
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Client-wide request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the HTTP client
    pub fn build(self) -> Result<HttpClient, TransportError> {
        let mut builder = reqwest::Client::builder();

        if let Some(proxy_url) = self.proxy {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .map_err(|e| TransportError::InvalidRequest(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;
        Ok(HttpClient { inner: client })
    }
}

/// Fetch `spec` with a fresh default client and permissive status handling
pub async fn fetch(spec: &RequestSpec) -> Result<FetchOutcome, FetchError> {
    FetchExecutor::new(HttpClient::new()).execute(spec).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transport_sends_method_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/modify")
            .match_header("x-token", "abc")
            .match_body("modify")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_header("x-double", "1")
            .with_header("x-double", "2")
            .with_body("modified")
            .create_async()
            .await;

        let request = http::Request::builder()
            .method(http::Method::PATCH)
            .uri(format!("{}/modify", server.url()))
            .header("X-Token", "abc")
            .body(Some(Bytes::from_static(b"modify")))
            .expect("Valid request");

        let response = HttpClient::new()
            .execute(request)
            .await
            .expect("Request should succeed");

        assert_eq!(TransportResponse::status(&response), 200);
        assert_eq!(
            TransportResponse::headers(&response)
                .get_all("x-double")
                .iter()
                .count(),
            2
        );
        let body = TransportResponse::bytes(response)
            .await
            .expect("Body should be readable");
        assert_eq!(&body[..], b"modified");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_without_body_sends_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/delete")
            .match_body("")
            .with_status(204)
            .create_async()
            .await;

        let request = http::Request::builder()
            .method(http::Method::DELETE)
            .uri(format!("{}/delete", server.url()))
            .body(None)
            .expect("Valid request");

        let response = HttpClient::from_reqwest(reqwest::Client::new())
            .execute(request)
            .await
            .expect("Request should succeed");

        assert_eq!(TransportResponse::status(&response), 204);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_connection_refused() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("Bind should succeed")
            .port();

        let request = http::Request::builder()
            .uri(format!("http://127.0.0.1:{port}/"))
            .body(None)
            .expect("Valid request");

        let result = HttpClient::default().execute(request).await;

        assert!(matches!(
            result,
            Err(TransportError::Connection(_)) | Err(TransportError::Other(_))
        ));
    }

    #[test]
    fn test_builder_build() {
        let result = HttpClient::builder().build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_chained_config() {
        let proxy_url = url::Url::parse("http://localhost:8080").expect("Valid proxy URL");
        let result = HttpClientBuilder::default()
            .proxy(proxy_url)
            .user_agent("http-fetch-test/1.0")
            .timeout(Duration::from_secs(5))
            .build();
        assert!(result.is_ok());
    }
}

//! Fetch a single HTTP resource and normalize the response
//!
//! A [`RequestSpec`] is validated, sent through a [`Transport`], and the
//! response is turned into a [`ResponseRecord`]: status code, body decoded as
//! UTF-8 and headers flattened into one value per name. Responses whose
//! Content-Type is not recognized as safe text still succeed but carry an
//! [`Advisory`].
//!
//! # Example
//!
//! ```no_run
//! use http_fetch::{fetch, RequestSpec};
//!
//! async fn example() -> Result<(), http_fetch::FetchError> {
//!     let spec = RequestSpec::new("https://example.com/version")
//!         .header("Accept", "application/json");
//!     let outcome = fetch(&spec).await?;
//!     println!("{}", outcome.record.response_body());
//!     Ok(())
//! }
//! ```

#[cfg(feature = "reqwest")]
mod client;
pub mod content_type;
mod error;
mod executor;
mod headers;
mod method;
mod request;
mod response;
mod transport;

#[cfg(feature = "reqwest")]
pub use client::{fetch, HttpClient, HttpClientBuilder};
pub use content_type::{classify, Classification, ContentTypeError, MediaType};
pub use error::{FetchError, TransportError, ValidationError};
pub use executor::{FetchExecutor, FetchPhase, FetchPolicy};
pub use headers::{canonical_header_name, flatten_headers, HEADER_VALUE_SEPARATOR};
pub use method::Method;
pub use request::RequestSpec;
pub use response::{Advisory, FetchOutcome, ResponseRecord, ResponseState};
pub use transport::{Transport, TransportRequest, TransportResponse};

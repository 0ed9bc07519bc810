//! Transport abstraction layer.
//!
//! The [`Transport`] trait is the single "execute a request" capability the
//! rest of the SDK is written against. [`HttpTransport`] implements it over a
//! reqwest connection pool, and [`TokenManager`](crate::auth::TokenManager)
//! implements it again by decorating another transport with bearer tokens.
//! Tests substitute scripted in-memory implementations.
//!
//! Transports never interpret status codes: a 401 or 500 is a successful
//! round-trip that produces a [`TransportResponse`]. Interpretation belongs
//! to the [`classify`](crate::classify) module.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cardlink_sdk::transport::{HttpTransport, Transport, TransportRequest};
//!
//! # async fn example() -> cardlink_sdk::Result<()> {
//! let transport = HttpTransport::new()?;
//! let response = transport
//!     .execute(TransportRequest::get("https://api.example.com/"))
//!     .await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use url::Url;

use crate::error::Result;

pub mod config;
pub mod http;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// Content type for JSON request bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type for form-encoded request bodies.
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// HTTP method of a [`TransportRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A single outbound request.
///
/// Requests are owned values so that a decorator can replay one after
/// replacing a header (see [`TransportRequest::with_header`]).
#[derive(Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: String,
    /// Request headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Raw request body (empty for `GET`).
    pub body: Vec<u8>,
}

impl TransportRequest {
    /// Creates a `GET` request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: Method::Get, url: url.into(), headers: Vec::new(), body: Vec::new() }
    }

    /// Creates a `POST` request with a JSON body.
    #[must_use]
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_owned(), CONTENT_TYPE_JSON.to_owned())],
            body,
        }
    }

    /// Creates a `POST` request with a form-encoded body.
    #[must_use]
    pub fn post_form(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_owned(), CONTENT_TYPE_FORM.to_owned())],
            body: body.into().into_bytes(),
        }
    }

    /// Sets a header, replacing any existing header of the same name
    /// (compared case-insensitively).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    /// Returns the header value for `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns the URL path used in error records.
    ///
    /// Falls back to the raw URL when it cannot be parsed.
    #[must_use]
    pub fn path(&self) -> String {
        Url::parse(&self.url).map_or_else(|_| self.url.clone(), |url| url.path().to_owned())
    }
}

impl std::fmt::Debug for TransportRequest {
    // Headers carry credentials and bodies carry card data; neither is printed.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers.len())
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Response from a transport round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    /// Creates a response from its parts.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into(), headers: Vec::new() }
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the header value for `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns `true` when the status is in `[200, 300)`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Request execution capability.
///
/// Implementations perform exactly one round-trip per call and return the
/// normalized response whatever its status code. Errors are reserved for
/// failures that produced no response at all.
pub trait Transport: Send + Sync {
    /// Executes a single request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or sent, or the
    /// response body cannot be read.
    fn execute(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + '_;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}

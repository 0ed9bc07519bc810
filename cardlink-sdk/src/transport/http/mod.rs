//! HTTP transport implementation.
//!
//! This module provides HTTP/1.1 and HTTP/2 transport using reqwest. Every
//! request carries the SDK version header; no other header is added here.

use reqwest::Client;
use tracing::{debug, instrument};
use url::{Host, Url};

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{Result, SdkError},
    transport::{Method, Transport, TransportRequest, TransportResponse},
};

/// Name of the header identifying the SDK build on every outbound request.
pub const SDK_VERSION_HEADER: &str = "X-Sdk-Version";

/// Value sent in [`SDK_VERSION_HEADER`].
pub const SDK_VERSION: &str = concat!("cardlink-sdk/", env!("CARGO_PKG_VERSION"));

/// Validates URL for security constraints.
///
/// Requires HTTPS and rejects loopback hosts unless `allow_insecure` is set.
fn validate_url(url: &Url, allow_insecure: bool) -> Result<()> {
    if allow_insecure {
        return match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(SdkError::Transport(format!("unsupported URL scheme: {other}"))),
        };
    }

    if url.scheme() != "https" {
        return Err(SdkError::Transport("Only HTTPS URLs are allowed".to_owned()));
    }

    if is_loopback(url) {
        return Err(SdkError::Transport("Localhost URLs are not allowed".to_owned()));
    }

    Ok(())
}

/// Returns `true` when the URL points at the local machine.
pub(crate) fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.contains(['\r', '\n', '\0']) {
        return Err(SdkError::Transport(
            "Invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(SdkError::Transport(
            "Invalid header value: control characters not allowed".to_owned(),
        ));
    }
    Ok(())
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Each instance owns its own connection pool, so several independently
/// configured clients can coexist in one process.
///
/// # Examples
///
/// ```
/// use cardlink_sdk::transport::{HttpConfig, HttpTransport, HttpVersion, Transport};
///
/// let config = HttpConfig { http_version: HttpVersion::Http1, ..HttpConfig::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// assert_eq!(transport.protocol_name(), "http/1.1");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
    allow_insecure_http: bool,
}

impl HttpTransport {
    /// Creates a new HTTP transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created (for example when
    /// the TLS backend fails to initialize).
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build().map_err(SdkError::Http)?;

        Ok(Self {
            client,
            http_version: config.http_version,
            allow_insecure_http: config.allow_insecure_http,
        })
    }

    #[instrument(
        skip(self, request),
        fields(method = request.method.as_str(), path = %request.path())
    )]
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let url = Url::parse(&request.url)
            .map_err(|e| SdkError::Transport(format!("invalid URL '{}': {e}", request.url)))?;

        validate_url(&url, self.allow_insecure_http)?;

        for (key, value) in &request.headers {
            validate_header(key, value)?;
        }

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        builder = builder.header(SDK_VERSION_HEADER, SDK_VERSION);

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_owned()))
            .collect();

        let body = response.bytes().await.map_err(SdkError::Http)?.to_vec();

        debug!(status, body_len = body.len(), "received response");

        Ok(TransportResponse { status, body, headers })
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.send(request).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

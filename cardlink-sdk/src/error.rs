//! Error types for the cardlink SDK.
//!
//! Every failure the SDK can surface is a variant of [`SdkError`]. Variants
//! that originate from a platform response carry an [`ErrorRecord`] so that
//! calling code can escalate with the request path, status and both
//! correlation identifiers.
//!
//! # Error Categories
//!
//! - **Credentials** ([`SdkError::Credentials`]): the platform rejected the
//!   client credentials or a token that could not be refreshed
//! - **Maintenance** ([`SdkError::Maintenance`]): the platform signalled
//!   temporary unavailability
//! - **Platform** ([`SdkError::Platform`]): any other non-2xx response,
//!   including an incompatible link contract
//! - **Encryption** ([`SdkError::Encryption`]): key generation, key agreement
//!   or payload encryption failed
//! - **Internal** ([`SdkError::Internal`]): a response violated the expected
//!   contract (2xx with an unparseable body)
//! - **Network** ([`SdkError::Http`], [`SdkError::Transport`]): the request
//!   never produced a platform response
//!
//! # Examples
//!
//! ```
//! use cardlink_sdk::error::{ErrorRecord, SdkError};
//!
//! let record = ErrorRecord::minimal("/oauth/token", 401);
//! let err = SdkError::Credentials(record);
//! assert!(err.is_credentials());
//! assert!(err.to_string().contains("/oauth/token"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker used for correlation identifiers missing from a response.
pub const ABSENT: &str = "N/A";

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Normalized diagnostic record extracted from a failed platform response.
///
/// The platform sends `summary` and `description` in the error body; the
/// path, status and correlation identifiers are filled in by the SDK from the
/// request and response headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Request path the error was returned for.
    #[serde(default)]
    pub path: String,
    /// HTTP status code.
    #[serde(default)]
    pub status: u16,
    /// Short error summary supplied by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description supplied by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// CDN ray identifier (`cf-ray` header).
    #[serde(default = "absent")]
    pub ray_id: String,
    /// Platform request identifier (`x-request-id` header).
    #[serde(default = "absent")]
    pub request_id: String,
}

fn absent() -> String {
    ABSENT.to_owned()
}

impl ErrorRecord {
    /// Creates a record carrying only a path and status.
    ///
    /// Used when an error body cannot be parsed; correlation identifiers are
    /// set to [`ABSENT`] until enriched from headers.
    #[must_use]
    pub fn minimal(path: impl Into<String>, status: u16) -> Self {
        Self {
            path: path.into(),
            status,
            summary: None,
            description: None,
            ray_id: absent(),
            request_id: absent(),
        }
    }

    /// Sets the summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {} at {}", self.status, self.path)?;
        if let Some(summary) = &self.summary {
            write!(f, ": {summary}")?;
        }
        if let Some(description) = &self.description {
            write!(f, " ({description})")?;
        }
        write!(f, " [ray-id={}, request-id={}]", self.ray_id, self.request_id)
    }
}

/// Errors that can occur in the cardlink SDK.
///
/// # Error Recovery
///
/// - [`Credentials`](Self::Credentials): not retryable; supply valid credentials
/// - [`Maintenance`](Self::Maintenance): back off and retry later
/// - [`Platform`](Self::Platform): escalate using the record's correlation ids
/// - [`Encryption`](Self::Encryption): never transient; check key material
/// - [`Internal`](Self::Internal): version mismatch or SDK bug
/// - [`Http`](Self::Http): network failure; retry at the caller's discretion
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum SdkError {
    /// Authentication or authorization was rejected.
    ///
    /// Raised for a 401 response and for any failed token fetch, including
    /// the refresh performed after a 401. A permanently invalid secret
    /// surfaces as this variant on every call.
    #[error("credentials rejected: {0}")]
    Credentials(ErrorRecord),

    /// The platform signalled maintenance mode.
    ///
    /// The SDK never retries this automatically.
    #[error("platform under maintenance: {0}")]
    Maintenance(ErrorRecord),

    /// The platform returned a non-2xx response, or does not serve a
    /// compatible link contract.
    #[error("platform error: {0}")]
    Platform(ErrorRecord),

    /// Key generation, key agreement or payload encryption failed.
    ///
    /// Bad key material does not become valid on retry.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// A response or payload violated the expected contract.
    #[error("internal SDK error: {0}")]
    Internal(String),

    /// HTTP request failed before a response was received.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS
    /// failures.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The request was rejected before it was sent.
    ///
    /// Covers URL and header validation failures.
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration is invalid or incomplete.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SdkError {
    /// Returns the attached [`ErrorRecord`], if the error came from a
    /// platform response.
    #[must_use]
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            Self::Credentials(record) | Self::Maintenance(record) | Self::Platform(record) => {
                Some(record)
            }
            _ => None,
        }
    }

    /// Returns `true` for [`SdkError::Credentials`].
    #[must_use]
    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::Credentials(_))
    }

    /// Returns `true` for [`SdkError::Maintenance`].
    #[must_use]
    pub fn is_maintenance(&self) -> bool {
        matches!(self, Self::Maintenance(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_uses_absent_marker() {
        let record = ErrorRecord::minimal("/cards", 500);
        assert_eq!(record.ray_id, ABSENT);
        assert_eq!(record.request_id, ABSENT);
        assert!(record.summary.is_none());
    }

    #[test]
    fn test_record_display() {
        let record = ErrorRecord::minimal("/cards", 400)
            .with_summary("BAD_REQUEST")
            .with_description("missing field");
        assert_eq!(
            record.to_string(),
            "status 400 at /cards: BAD_REQUEST (missing field) [ray-id=N/A, request-id=N/A]"
        );
    }

    #[test]
    fn test_record_deserializes_partial_body() {
        let record: ErrorRecord =
            serde_json::from_str(r#"{"summary":"UNAUTHORIZED"}"#).unwrap();
        assert_eq!(record.summary.as_deref(), Some("UNAUTHORIZED"));
        assert_eq!(record.ray_id, ABSENT);
        assert_eq!(record.status, 0);
    }

    #[test]
    fn test_error_display() {
        let error = SdkError::Encryption("bad key".into());
        assert_eq!(error.to_string(), "encryption failed: bad key");
    }

    #[test]
    fn test_record_accessor() {
        let error = SdkError::Maintenance(ErrorRecord::minimal("/", 503));
        assert!(error.is_maintenance());
        assert_eq!(error.record().map(|r| r.status), Some(503));

        let error = SdkError::Internal("oops".into());
        assert!(error.record().is_none());
    }
}

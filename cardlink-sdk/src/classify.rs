//! Response classification.
//!
//! [`classify`] turns a raw [`TransportResponse`] into either a parsed
//! success value or a typed [`SdkError`]. It performs no I/O and holds no
//! state; the same response always classifies the same way.
//!
//! Classification order:
//!
//! 1. `2xx`: deserialize the body; an unparseable body is a contract
//!    violation ([`SdkError::Internal`]).
//! 2. `maintenance-mode: true` header: [`SdkError::Maintenance`], whatever
//!    the status or body.
//! 3. `401`: [`SdkError::Credentials`] with a parsed or synthesized
//!    [`ErrorRecord`].
//! 4. Anything else: [`SdkError::Platform`] with a parsed or synthesized
//!    [`ErrorRecord`].
//!
//! # Examples
//!
//! ```
//! use cardlink_sdk::{
//!     classify::classify,
//!     platform::HealthStatus,
//!     transport::TransportResponse,
//! };
//!
//! let response = TransportResponse::new(200, r#"{"status":"UP"}"#);
//! let parsed = classify::<HealthStatus>("/health", &response).unwrap();
//! assert_eq!(parsed.status, 200);
//! assert_eq!(parsed.value.status, "UP");
//! ```

use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{ABSENT, ErrorRecord, Result, SdkError},
    transport::TransportResponse,
};

/// CDN ray correlation header.
pub const RAY_ID_HEADER: &str = "cf-ray";

/// Platform request correlation header.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header the platform sets while in maintenance mode.
pub const MAINTENANCE_HEADER: &str = "maintenance-mode";

/// HTTP status for an unauthorized request.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// A successfully parsed response body with its transport status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    /// HTTP status code of the response.
    pub status: u16,
    /// Deserialized body.
    pub value: T,
}

/// Classifies a response for the request sent to `path`.
///
/// # Errors
///
/// Returns the [`SdkError`] variant selected by the classification order
/// described in the module documentation.
pub fn classify<T: DeserializeOwned>(
    path: &str,
    response: &TransportResponse,
) -> Result<Parsed<T>> {
    if response.is_success() {
        return serde_json::from_slice::<T>(&response.body)
            .map(|value| Parsed { status: response.status, value })
            .map_err(|e| {
                SdkError::Internal(format!(
                    "unparseable {} response body from {path}: {e}",
                    response.status
                ))
            });
    }

    Err(classify_failure(path, response))
}

/// Classifies a non-2xx response into its error variant.
///
/// Callers that already know the response failed (for example the token
/// fetch) use this directly.
#[must_use]
pub fn classify_failure(path: &str, response: &TransportResponse) -> SdkError {
    let record = error_record(path, response);

    if is_maintenance(response) {
        SdkError::Maintenance(record)
    } else if response.status == STATUS_UNAUTHORIZED {
        SdkError::Credentials(record)
    } else {
        SdkError::Platform(record)
    }
}

/// Returns `true` when the response carries `maintenance-mode: true`.
#[must_use]
pub fn is_maintenance(response: &TransportResponse) -> bool {
    response
        .header(MAINTENANCE_HEADER)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

/// Fields of a platform error body the SDK keeps.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Builds an [`ErrorRecord`] for a failed response.
///
/// Only `summary` and `description` are taken from the body, and an
/// unparseable body leaves both empty. Path, status and correlation
/// identifiers always come from the request and response.
#[must_use]
pub fn error_record(path: &str, response: &TransportResponse) -> ErrorRecord {
    let mut record = ErrorRecord::minimal(path, response.status);
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(&response.body) {
        record.summary = body.summary;
        record.description = body.description;
    }

    record.ray_id = correlation_id(response, RAY_ID_HEADER);
    record.request_id = correlation_id(response, REQUEST_ID_HEADER);
    record
}

fn correlation_id(response: &TransportResponse, header: &str) -> String {
    response
        .header(header)
        .filter(|value| !value.is_empty())
        .unwrap_or(ABSENT)
        .to_owned()
}

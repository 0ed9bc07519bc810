//! Wire models of the platform API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::links::{Link, LinkMap};

/// Root hypermedia resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RootResource {
    /// Advertised relations.
    #[serde(rename = "_links", default)]
    pub links: BTreeMap<String, Link>,
}

impl RootResource {
    /// Flattens the advertised links into a [`LinkMap`].
    #[must_use]
    pub fn into_link_map(self) -> LinkMap {
        LinkMap::from(self.links)
    }
}

/// Result of a health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status reported by the platform, e.g. `UP`.
    pub status: String,

    /// HTTP status code of the health response, filled in by the client.
    #[serde(skip_deserializing, default, rename = "httpStatus")]
    pub http_status: u16,
}

impl HealthStatus {
    /// Returns `true` when the platform reports `UP`.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }
}

/// Body of a key-exchange request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyExchangeRequest<'a> {
    /// Hex-encoded DER public key of the ephemeral pair.
    pub client_public_key: &'a str,
}

/// Key published by the platform in response to a key exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyExchangeRecord {
    /// Identifier of the platform key; goes into the JWE `kid` header.
    pub key_id: String,
    /// Platform public key, hex-encoded DER or SEC1.
    pub server_public_key: String,
    /// Whether the platform considers this key current.
    #[serde(default)]
    pub active: bool,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created_ts: Option<i64>,
    /// Expiration time, epoch milliseconds.
    #[serde(default)]
    pub expiration_ts: Option<i64>,
    /// Related links.
    #[serde(rename = "_links", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, Link>,
}

/// Body of a card registration request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest<'a> {
    /// JWE compact serialization of the card data.
    pub encrypted_data: &'a str,
}

/// Outcome of a card registration.
///
/// The platform returns a single deep link, a map of deep links per target
/// platform, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    /// Deep link into the companion app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_link: Option<String>,
    /// Deep links keyed by target platform, e.g. `ios` or `android`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deep_links: BTreeMap<String, String>,
}

impl RegistrationResult {
    /// Returns the single deep link, or the first per-platform link.
    #[must_use]
    pub fn primary_deep_link(&self) -> Option<&str> {
        self.deep_link
            .as_deref()
            .or_else(|| self.deep_links.values().next().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_resource_parsing() {
        let root: RootResource = serde_json::from_str(concat!(
            r#"{"_links":{"self":{"href":"https://a/"},"health":{"href":"https://a/health"}},"#,
            r#""version":"2"}"#,
        ))
        .unwrap();
        let links = root.into_link_map();
        assert_eq!(links.get("health"), Some("https://a/health"));
    }

    #[test]
    fn test_root_without_links_is_empty() {
        let root: RootResource = serde_json::from_str("{}").unwrap();
        assert!(root.into_link_map().is_empty());
    }

    #[test]
    fn test_key_exchange_record() {
        let record: KeyExchangeRecord = serde_json::from_str(
            r#"{
                "keyId": "k-1",
                "serverPublicKey": "04ab",
                "active": true,
                "createdTs": 1700000000000,
                "expirationTs": 1700086400000,
                "_links": {"self": {"href": "https://a/keys/k-1"}}
            }"#,
        )
        .unwrap();
        assert_eq!(record.key_id, "k-1");
        assert!(record.active);
        assert_eq!(record.expiration_ts, Some(1_700_086_400_000));
        assert_eq!(record.links["self"].href, "https://a/keys/k-1");
    }

    #[test]
    fn test_request_bodies() {
        let body =
            serde_json::to_string(&KeyExchangeRequest { client_public_key: "3059" }).unwrap();
        assert_eq!(body, r#"{"clientPublicKey":"3059"}"#);

        let body =
            serde_json::to_string(&RegistrationRequest { encrypted_data: "a.b.c.d.e" }).unwrap();
        assert_eq!(body, r#"{"encryptedData":"a.b.c.d.e"}"#);
    }

    #[test]
    fn test_primary_deep_link() {
        let single: RegistrationResult =
            serde_json::from_str(r#"{"deepLink":"app://card/1"}"#).unwrap();
        assert_eq!(single.primary_deep_link(), Some("app://card/1"));

        let per_platform: RegistrationResult =
            serde_json::from_str(r#"{"deepLinks":{"android":"app://a","ios":"app://i"}}"#).unwrap();
        assert_eq!(per_platform.primary_deep_link(), Some("app://a"));

        assert_eq!(RegistrationResult::default().primary_deep_link(), None);
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus = serde_json::from_str(r#"{"status":"up"}"#).unwrap();
        assert!(health.is_up());
        assert_eq!(health.http_status, 0);
    }
}

//! Relation name to URL map discovered from the root resource.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relation of the root resource itself.
pub const REL_SELF: &str = "self";
/// Relation of the health endpoint.
pub const REL_HEALTH: &str = "health";
/// Relation of the key-exchange endpoint.
pub const REL_ENCRYPTION_KEYS: &str = "encryptionKeys";
/// Relation of the card registration endpoint.
pub const REL_PAYMENT_CARDS: &str = "paymentCards";

/// Relations a compatible platform must advertise.
pub const REQUIRED_RELATIONS: [&str; 4] =
    [REL_SELF, REL_HEALTH, REL_ENCRYPTION_KEYS, REL_PAYMENT_CARDS];

/// A single hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL.
    pub href: String,
}

/// Immutable map from relation name to URL.
///
/// # Examples
///
/// ```
/// use cardlink_sdk::platform::{LinkMap, REQUIRED_RELATIONS};
///
/// let links: LinkMap = [
///     ("self", "https://api.example.com/"),
///     ("health", "https://api.example.com/health"),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(links.get("health"), Some("https://api.example.com/health"));
/// assert_eq!(links.missing(&REQUIRED_RELATIONS), vec!["encryptionKeys", "paymentCards"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LinkMap(BTreeMap<String, String>);

impl LinkMap {
    /// Returns the URL for `relation`.
    #[must_use]
    pub fn get(&self, relation: &str) -> Option<&str> {
        self.0.get(relation).map(String::as_str)
    }

    /// Returns `true` if `relation` is present.
    #[must_use]
    pub fn contains(&self, relation: &str) -> bool {
        self.0.contains_key(relation)
    }

    /// Returns the entries of `required` that are not present.
    #[must_use]
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required.iter().copied().filter(|rel| !self.contains(rel)).collect()
    }

    /// Number of relations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no relation is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(relation, url)` pairs in relation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(rel, url)| (rel.as_str(), url.as_str()))
    }
}

impl From<BTreeMap<String, Link>> for LinkMap {
    fn from(links: BTreeMap<String, Link>) -> Self {
        Self(links.into_iter().map(|(rel, link)| (rel, link.href)).collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LinkMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hal_links() {
        let raw: BTreeMap<String, Link> = serde_json::from_str(
            r#"{"self":{"href":"https://a/"},"paymentCards":{"href":"https://a/cards"}}"#,
        )
        .unwrap();
        let links = LinkMap::from(raw);

        assert_eq!(links.len(), 2);
        assert_eq!(links.get(REL_PAYMENT_CARDS), Some("https://a/cards"));
        assert!(links.get(REL_HEALTH).is_none());
    }

    #[test]
    fn test_missing_preserves_required_order() {
        let links: LinkMap = [(REL_PAYMENT_CARDS, "x")].into_iter().collect();
        assert_eq!(
            links.missing(&REQUIRED_RELATIONS),
            vec![REL_SELF, REL_HEALTH, REL_ENCRYPTION_KEYS]
        );
    }

    #[test]
    fn test_iter_in_relation_order() {
        let links: LinkMap =
            [(REL_PAYMENT_CARDS, "https://a/cards"), (REL_HEALTH, "https://a/health")]
                .into_iter()
                .collect();
        let relations: Vec<_> = links.iter().map(|(rel, _)| rel).collect();
        assert_eq!(relations, [REL_HEALTH, REL_PAYMENT_CARDS]);
        assert_eq!(links.iter().next(), Some((REL_HEALTH, "https://a/health")));
    }

    #[test]
    fn test_empty_map() {
        let links = LinkMap::default();
        assert!(links.is_empty());
        assert_eq!(links.missing(&REQUIRED_RELATIONS).len(), 4);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let links: LinkMap = [("self", "https://a/")].into_iter().collect();
        assert_eq!(serde_json::to_string(&links).unwrap(), r#"{"self":"https://a/"}"#);
    }
}

//! Client credentials.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use zeroize::Zeroize;

use crate::{
    config::CredentialConfig,
    error::{Result, SdkError},
};

/// Client identifier and secret issued by the platform.
///
/// The pair is combined and base64-encoded only when
/// [`basic_auth_header`](Self::basic_auth_header) is called. `Debug` output
/// never contains the secret, and the secret is zeroized on drop.
///
/// # Examples
///
/// ```
/// use cardlink_sdk::auth::Credential;
///
/// let credential = Credential::new("issuer-42", "s3cr3t");
/// assert_eq!(credential.client_id(), "issuer-42");
/// assert_eq!(credential.basic_auth_header(), "Basic aXNzdWVyLTQyOnMzY3IzdA==");
/// assert!(!format!("{credential:?}").contains("s3cr3t"));
/// ```
#[derive(Clone)]
pub struct Credential {
    client_id: String,
    client_secret: String,
}

impl Credential {
    /// Creates a credential from its parts.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self { client_id: client_id.into(), client_secret: client_secret.into() }
    }

    /// Reads the credential from the environment variables named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Config`] if either variable is unset or empty.
    pub fn from_env(config: &CredentialConfig) -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or_else(|| SdkError::Config(format!("environment variable {name} is not set")))
        };

        Ok(Self::new(read(&config.client_id_env)?, read(&config.client_secret_env)?))
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Builds the `Authorization` header value for HTTP Basic auth.
    #[must_use]
    pub fn basic_auth_header(&self) -> String {
        let mut pair = format!("{}:{}", self.client_id, self.client_secret);
        let encoded = STANDARD.encode(pair.as_bytes());
        pair.zeroize();
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.client_secret.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header_encoding() {
        let credential = Credential::new("client", "secret");
        // base64("client:secret")
        assert_eq!(credential.basic_auth_header(), "Basic Y2xpZW50OnNlY3JldA==");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credential = Credential::new("client", "very-secret-value");
        let debug_str = format!("{credential:?}");
        assert!(debug_str.contains("client"));
        assert!(debug_str.contains("<redacted>"));
        assert!(!debug_str.contains("very-secret-value"));
    }

    #[test]
    fn test_from_env_missing_variable() {
        let config = CredentialConfig {
            client_id_env: "CARDLINK_TEST_UNSET_ID_6B1F".to_owned(),
            client_secret_env: "CARDLINK_TEST_UNSET_SECRET_6B1F".to_owned(),
        };
        let result = Credential::from_env(&config);
        assert!(matches!(
            result,
            Err(SdkError::Config(msg)) if msg.contains("CARDLINK_TEST_UNSET_ID_6B1F")
        ));
    }
}

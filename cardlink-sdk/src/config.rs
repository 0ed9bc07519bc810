//! SDK configuration.
//!
//! Configuration is read from TOML. Secrets are never stored in the file;
//! the `[credentials]` table names the environment variables that hold them.
//!
//! ```toml
//! base_url = "https://api.cardlink.example.com/"
//! auth_url = "https://auth.cardlink.example.com/oauth/token"
//!
//! [credentials]
//! client_id_env = "CARDLINK_CLIENT_ID"
//! client_secret_env = "CARDLINK_CLIENT_SECRET"
//!
//! [http]
//! timeout_secs = 20
//! ```

use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::{
    error::{Result, SdkError},
    transport::{HttpConfig, http::is_loopback},
};

/// Root SDK configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SdkConfig {
    /// URL of the platform's root hypermedia resource.
    pub base_url: String,

    /// URL of the OAuth2 token endpoint.
    pub auth_url: String,

    /// Where to find the client credentials.
    #[serde(default)]
    pub credentials: CredentialConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Names of the environment variables holding the client credentials.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CredentialConfig {
    /// Variable holding the client identifier.
    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,

    /// Variable holding the client secret.
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            client_id_env: default_client_id_env(),
            client_secret_env: default_client_secret_env(),
        }
    }
}

fn default_client_id_env() -> String {
    "CARDLINK_CLIENT_ID".to_owned()
}

fn default_client_secret_env() -> String {
    "CARDLINK_CLIENT_SECRET".to_owned()
}

impl SdkConfig {
    /// Creates a configuration with default credential and HTTP settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>, auth_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_url: auth_url.into(),
            credentials: CredentialConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Config`] if the TOML is malformed or validation
    /// fails.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| SdkError::Config(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Config`] if the file cannot be read or is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SdkError::Config(format!("cannot read config file {}: {e}", path.as_ref().display()))
        })?;
        Self::from_toml(&content)
    }

    /// Validates URLs, environment variable names and HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url, self.http.allow_insecure_http)?;
        validate_url("auth_url", &self.auth_url, self.http.allow_insecure_http)?;
        validate_env_var_name(&self.credentials.client_id_env)?;
        validate_env_var_name(&self.credentials.client_secret_env)?;
        self.http.validate()
    }
}

fn validate_url(field: &str, raw: &str, allow_insecure: bool) -> Result<()> {
    let url =
        Url::parse(raw).map_err(|e| SdkError::Config(format!("invalid {field} '{raw}': {e}")))?;

    match url.scheme() {
        "https" | "http" if allow_insecure => Ok(()),
        "https" if is_loopback(&url) => Err(SdkError::Config(format!(
            "{field} points at localhost; set http.allow_insecure_http for local testing"
        ))),
        "https" => Ok(()),
        other => Err(SdkError::Config(format!("{field} must use HTTPS, got: {other}"))),
    }
}

fn validate_env_var_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SdkError::Config(format!("invalid environment variable name: '{name}'")));
    }
    Ok(())
}

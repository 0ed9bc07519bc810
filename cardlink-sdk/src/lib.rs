//! cardlink SDK: encrypted card registration for issuers
//!
//! A client library for registering a payment card with a remote
//! card-provisioning platform without the card number ever crossing the wire
//! in cleartext.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │    PlatformClient    │  link discovery, registration workflow
//! └──────────┬───────────┘
//!            │ TransportRequest
//! ┌──────────▼───────────┐
//! │     TokenManager     │  bearer token, one refresh + one retry on 401
//! └──────────┬───────────┘
//!            │ TransportRequest
//! ┌──────────▼───────────┐
//! │    HttpTransport     │  reqwest, HTTPS, X-Sdk-Version
//! └──────────────────────┘
//! ```
//!
//! Every response is turned into a value or a typed [`SdkError`] by
//! [`classify`](classify::classify). Card payloads are encrypted by
//! [`crypto`] with a per-registration P-256 key pair before they reach the
//! transport.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cardlink_sdk::{Credential, PlatformClient, SdkConfig, card::CardData};
//!
//! # async fn example() -> cardlink_sdk::Result<()> {
//! let config = SdkConfig::new(
//!     "https://api.cardlink.example.com/",
//!     "https://auth.cardlink.example.com/oauth/token",
//! );
//! let credential = Credential::new("issuer-42", "s3cr3t");
//! let client = PlatformClient::connect(&config, credential).await?;
//!
//! let health = client.health().await?;
//! println!("platform is {} (HTTP {})", health.status, health.http_status);
//!
//! let card = CardData::new("4111111111111111", "12", "2030", "123", "Jane Doe");
//! let registration = client.register_card_flow(&card).await?;
//! if let Some(link) = registration.primary_deep_link() {
//!     println!("open {link} to finish provisioning");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! ```rust,no_run
//! use cardlink_sdk::{Credential, PlatformClient, SdkConfig, SdkError};
//!
//! # async fn example(config: SdkConfig) {
//! let credential = Credential::new("issuer-42", "wrong");
//! match PlatformClient::connect(&config, credential).await {
//!     Ok(_) => println!("connected"),
//!     Err(SdkError::Credentials(record)) => {
//!         eprintln!("credentials rejected: {record}");
//!         // Supply a valid client secret
//!     }
//!     Err(SdkError::Maintenance(record)) => {
//!         eprintln!("platform in maintenance ({})", record.request_id);
//!         // Back off and retry later
//!     }
//!     Err(SdkError::Http(e)) => eprintln!("network error: {e}"),
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`]: credentials and the token-managing transport decorator
//! - [`platform`]: link discovery, wire models and the registration workflow
//! - [`crypto`]: ephemeral key agreement and the JWE card envelope
//! - [`classify`]: response classification
//! - [`transport`]: transport abstraction and the reqwest implementation
//! - [`config`]: TOML configuration
//! - [`card`]: card and address data holders
//! - [`error`]: error taxonomy
//!
//! # Security Considerations
//!
//! - Client secret, tokens, private keys and shared secrets are redacted from
//!   `Debug` output and zeroized on drop
//! - Card numbers are never logged; only the last four digits appear in spans
//! - A key pair is generated per registration and discarded with it
//! - Plain HTTP is rejected unless `http.allow_insecure_http` is set

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and josekit"
)]

pub mod auth;
pub mod card;
pub mod classify;
pub mod config;
pub mod crypto;
pub mod error;
pub mod platform;
pub mod transport;

pub use auth::{Credential, TokenManager};
pub use config::SdkConfig;
pub use error::{ErrorRecord, Result, SdkError};
pub use platform::PlatformClient;


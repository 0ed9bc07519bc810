//! Key exchange and payload encryption.
//!
//! Every registration uses a fresh P-256 key pair. The SDK submits the public
//! half to the platform, derives an ECDH shared secret against the platform's
//! public key, and uses that secret to wrap the content key of a JWE
//! (`A256GCMKW` + `A256GCM`) carrying the card data. The key pair and the
//! secret never outlive the registration call, which gives forward secrecy
//! per transaction.
//!
//! # Examples
//!
//! ```
//! use cardlink_sdk::{
//!     card::CardData,
//!     crypto::{derive_shared_secret, encrypt_card_data, generate_key_pair},
//! };
//!
//! # fn main() -> cardlink_sdk::Result<()> {
//! let ephemeral = generate_key_pair()?;
//! # let server = generate_key_pair()?;
//! # let server_public_key = server.public_key();
//! // `server_public_key` comes from the key-exchange endpoint
//! let secret = derive_shared_secret(server_public_key, ephemeral.private_key())?;
//!
//! let card = CardData::new("4111111111111111", "12", "2030", "123", "Jane Doe");
//! let payload = encrypt_card_data(&card, secret, "server-key-id")?;
//! assert!(payload.starts_with("ey"));
//! # Ok(())
//! # }
//! ```

mod envelope;
mod keys;

pub use envelope::{CONTENT_ENCRYPTION, CONTENT_TYPE, KEY_WRAP_ALGORITHM, encrypt_card_data};
pub use keys::{
    EphemeralKeyPair, SHARED_SECRET_LEN, SharedSecret, derive_shared_secret, generate_key_pair,
};

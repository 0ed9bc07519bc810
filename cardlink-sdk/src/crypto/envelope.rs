//! JWE envelope for card data.

use josekit::jwe::{A256GCMKW, JweHeader};
use tracing::debug;
use zeroize::Zeroizing;

use super::SharedSecret;
use crate::{
    card::CardData,
    error::{Result, SdkError},
};

/// Key management algorithm: AES-256 key wrap with GCM.
pub const KEY_WRAP_ALGORITHM: &str = "A256GCMKW";

/// Content encryption algorithm.
pub const CONTENT_ENCRYPTION: &str = "A256GCM";

/// Content type marking the envelope as encrypted.
pub const CONTENT_TYPE: &str = "JWE";

/// Encrypts card data into a JWE compact serialization.
///
/// The shared secret wraps a random content-encryption key; the header
/// carries `kid` so the platform can select the private key it used for its
/// side of the key agreement. The secret is consumed and zeroized when this
/// function returns, so the caller cannot decrypt the result.
///
/// # Errors
///
/// Returns [`SdkError::Encryption`] if serialization or encryption fails.
///
/// # Examples
///
/// ```
/// use cardlink_sdk::{
///     card::CardData,
///     crypto::{derive_shared_secret, encrypt_card_data, generate_key_pair},
/// };
///
/// let client = generate_key_pair()?;
/// let server = generate_key_pair()?;
/// let secret = derive_shared_secret(server.public_key(), client.private_key())?;
///
/// let card = CardData::new("4111111111111111", "12", "2030", "123", "Jane Doe");
/// let jwe = encrypt_card_data(&card, secret, "key-1")?;
///
/// // header.encrypted_key.iv.ciphertext.tag
/// assert_eq!(jwe.split('.').count(), 5);
/// # Ok::<(), cardlink_sdk::SdkError>(())
/// ```
pub fn encrypt_card_data(card: &CardData, secret: SharedSecret, key_id: &str) -> Result<String> {
    let plaintext = Zeroizing::new(serde_json::to_vec(card).map_err(|e| {
        SdkError::Encryption(format!("card data serialization failed: {e}"))
    })?);

    let encrypter = A256GCMKW
        .encrypter_from_bytes(secret.as_bytes())
        .map_err(|e| SdkError::Encryption(format!("invalid key-wrapping key: {e}")))?;
    drop(secret);

    let mut header = JweHeader::new();
    header.set_algorithm(KEY_WRAP_ALGORITHM);
    header.set_content_encryption(CONTENT_ENCRYPTION);
    header.set_content_type(CONTENT_TYPE);
    header.set_key_id(key_id);

    let jwe = josekit::jwe::serialize_compact(&plaintext, &header, &encrypter)
        .map_err(|e| SdkError::Encryption(format!("JWE encryption failed: {e}")))?;

    debug!(key_id, last_four = card.last_four(), "card data encrypted");
    Ok(jwe)
}

//! Ephemeral P-256 key pairs and ECDH key agreement.

use std::fmt;

use p256::{
    PublicKey, SecretKey,
    ecdh::diffie_hellman,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey},
};
use rand::rngs::OsRng;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, SdkError};

/// Length in bytes of the derived key-wrapping key.
pub const SHARED_SECRET_LEN: usize = 32;

/// Key pair generated for a single registration attempt.
///
/// Both halves are hex strings: the public key is DER `SubjectPublicKeyInfo`,
/// the private key is DER PKCS#8. The private key is zeroized on drop and is
/// never sent anywhere.
pub struct EphemeralKeyPair {
    public_key: String,
    private_key: String,
}

impl EphemeralKeyPair {
    /// Hex-encoded DER public key, as submitted to the key-exchange endpoint.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Hex-encoded PKCS#8 private key.
    #[must_use]
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Drop for EphemeralKeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// ECDH output used directly as the AES-256 key-wrapping key.
///
/// Encryption takes the secret by value, so it is gone once the payload has
/// been produced.
pub struct SharedSecret([u8; SHARED_SECRET_LEN]);

impl SharedSecret {
    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_LEN] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Generates a fresh P-256 key pair from the OS random source.
///
/// # Errors
///
/// Returns [`SdkError::Encryption`] if either key cannot be DER-encoded.
///
/// # Examples
///
/// ```
/// use cardlink_sdk::crypto::generate_key_pair;
///
/// let pair = generate_key_pair()?;
/// assert!(pair.public_key().chars().all(|c| c.is_ascii_hexdigit()));
/// # Ok::<(), cardlink_sdk::SdkError>(())
/// ```
pub fn generate_key_pair() -> Result<EphemeralKeyPair> {
    let secret = SecretKey::random(&mut OsRng);

    let private_der = secret
        .to_pkcs8_der()
        .map_err(|e| SdkError::Encryption(format!("failed to encode private key: {e}")))?;
    let public_der = secret
        .public_key()
        .to_public_key_der()
        .map_err(|e| SdkError::Encryption(format!("failed to encode public key: {e}")))?;

    Ok(EphemeralKeyPair {
        public_key: hex::encode(public_der.as_bytes()),
        private_key: hex::encode(private_der.as_bytes()),
    })
}

/// Derives the shared secret between a peer public key and a local private key.
///
/// `peer_public_hex` may be a DER `SubjectPublicKeyInfo` or a raw SEC1 point
/// (compressed or uncompressed). `private_hex` is DER PKCS#8. ECDH is
/// symmetric, so the platform derives the same value from its own private key
/// and our public key.
///
/// # Errors
///
/// Returns [`SdkError::Encryption`] if either key is not valid hex or not a
/// valid P-256 key. Retrying with the same input will fail the same way.
///
/// # Examples
///
/// ```
/// use cardlink_sdk::crypto::{derive_shared_secret, generate_key_pair};
///
/// let client = generate_key_pair()?;
/// let server = generate_key_pair()?;
///
/// let ours = derive_shared_secret(server.public_key(), client.private_key())?;
/// let theirs = derive_shared_secret(client.public_key(), server.private_key())?;
/// assert_eq!(ours.as_bytes(), theirs.as_bytes());
/// # Ok::<(), cardlink_sdk::SdkError>(())
/// ```
pub fn derive_shared_secret(peer_public_hex: &str, private_hex: &str) -> Result<SharedSecret> {
    let peer = decode_public_key(peer_public_hex)?;

    let private_der = Zeroizing::new(
        hex::decode(private_hex.trim())
            .map_err(|e| SdkError::Encryption(format!("private key is not valid hex: {e}")))?,
    );
    let secret = SecretKey::from_pkcs8_der(&private_der)
        .map_err(|e| SdkError::Encryption(format!("invalid private key: {e}")))?;

    let shared = diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    let mut key = [0u8; SHARED_SECRET_LEN];
    key.copy_from_slice(shared.raw_secret_bytes());

    Ok(SharedSecret(key))
}

fn decode_public_key(public_hex: &str) -> Result<PublicKey> {
    let bytes = hex::decode(public_hex.trim())
        .map_err(|e| SdkError::Encryption(format!("public key is not valid hex: {e}")))?;

    PublicKey::from_public_key_der(&bytes)
        .or_else(|_| PublicKey::from_sec1_bytes(&bytes))
        .map_err(|_| SdkError::Encryption("public key is neither DER nor SEC1 P-256".to_owned()))
}

#[cfg(test)]
mod tests {
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    use super::*;

    #[test]
    fn test_key_pair_is_der_hex() {
        let pair = generate_key_pair().unwrap();

        let public = hex::decode(pair.public_key()).unwrap();
        assert!(PublicKey::from_public_key_der(&public).is_ok());

        let private = hex::decode(pair.private_key()).unwrap();
        assert!(SecretKey::from_pkcs8_der(&private).is_ok());
    }

    #[test]
    fn test_key_pairs_are_unique() {
        let a = generate_key_pair().unwrap();
        let b = generate_key_pair().unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_agreement_is_symmetric() {
        let client = generate_key_pair().unwrap();
        let server = generate_key_pair().unwrap();

        let ours = derive_shared_secret(server.public_key(), client.private_key()).unwrap();
        let theirs = derive_shared_secret(client.public_key(), server.private_key()).unwrap();
        assert_eq!(ours.as_bytes(), theirs.as_bytes());
    }

    #[test]
    fn test_sec1_server_key_accepted() {
        let client = generate_key_pair().unwrap();
        let server = SecretKey::random(&mut OsRng);
        let sec1 = hex::encode(server.public_key().to_encoded_point(false).as_bytes());
        let der = hex::encode(server.public_key().to_public_key_der().unwrap().as_bytes());

        let from_sec1 = derive_shared_secret(&sec1, client.private_key()).unwrap();
        let from_der = derive_shared_secret(&der, client.private_key()).unwrap();
        assert_eq!(from_sec1.as_bytes(), from_der.as_bytes());
    }

    #[test]
    fn test_malformed_keys_are_encryption_errors() {
        let pair = generate_key_pair().unwrap();

        let bad_hex = derive_shared_secret("zz-not-hex", pair.private_key());
        assert!(matches!(bad_hex, Err(SdkError::Encryption(_))));

        let not_a_key = derive_shared_secret("deadbeef", pair.private_key());
        assert!(matches!(not_a_key, Err(SdkError::Encryption(_))));

        let bad_private = derive_shared_secret(pair.public_key(), "00ff");
        assert!(matches!(bad_private, Err(SdkError::Encryption(_))));
    }

    #[test]
    fn test_debug_redacts_private_material() {
        let pair = generate_key_pair().unwrap();
        let debug_str = format!("{pair:?}");
        assert!(!debug_str.contains(pair.private_key()));

        let secret = derive_shared_secret(pair.public_key(), pair.private_key()).unwrap();
        assert_eq!(format!("{secret:?}"), "SharedSecret(<redacted>)");
    }
}

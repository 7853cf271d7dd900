use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

use mixcraft_core::PeerId;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid secret key length")]
    InvalidSecretKey,
}

/// Keypair for signing (Ed25519)
///
/// A node's signing keypair doubles as its network identity: the verifying
/// key bytes are its peer id. Nodes without one run bootstrap-only and
/// never relay.
pub struct SigningKeypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl Clone for SigningKeypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
            verifying_key: self.verifying_key,
        }
    }
}

impl SigningKeypair {
    /// Generate a new random signing keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Get the public key as bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Get the secret key as bytes
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The peer id this keypair identifies as
    pub fn peer_id(&self) -> PeerId {
        PeerId::from_bytes(self.public_key_bytes())
    }

    /// Create from raw secret key bytes
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from a keyfile's raw contents; fails on any length other
    /// than 32 bytes.
    pub fn from_secret_slice(secret: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = secret.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_secret_bytes(&bytes))
    }
}

impl std::fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secret material
        f.debug_struct("SigningKeypair")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_distinct_keypairs() {
        let a = SigningKeypair::generate();
        let b = SigningKeypair::generate();
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn test_from_secret_roundtrip() {
        let keypair = SigningKeypair::generate();
        let restored = SigningKeypair::from_secret_bytes(&keypair.secret_key_bytes());
        assert_eq!(keypair.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn test_peer_id_is_public_key() {
        let keypair = SigningKeypair::generate();
        assert_eq!(keypair.peer_id().as_bytes(), &keypair.public_key_bytes());
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(SigningKeypair::from_secret_slice(&[0u8; 31]).is_err());
        let keypair = SigningKeypair::generate();
        let restored = SigningKeypair::from_secret_slice(&keypair.secret_key_bytes()).unwrap();
        assert_eq!(keypair.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = SigningKeypair::generate();
        let debug = format!("{:?}", keypair);
        assert!(!debug.contains(&hex::encode(keypair.secret_key_bytes())));
    }
}

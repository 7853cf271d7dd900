use serde::{Deserialize, Serialize};

/// 32-byte identifier (hashes, challenges, channel ids)
pub type Id = [u8; 32];

/// 32-byte ed25519 public key
pub type PublicKey = [u8; 32];

/// 64-byte ed25519 signature (use BigArray for serde support)
pub type Signature = [u8; 64];

/// Width of a peer identifier on the wire
pub const PEER_ID_LENGTH: usize = 32;

/// A node's stable network identity: its ed25519 public key.
///
/// Fixed-width so it can be laid into packet headers without a length
/// prefix. Display renders the hex form used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub PublicKey);

impl PeerId {
    pub fn as_bytes(&self) -> &[u8; PEER_ID_LENGTH] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; PEER_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse from a slice; fails on any length other than 32 bytes.
    pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; PEER_ID_LENGTH] = slice.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<PublicKey> for PeerId {
    fn from(pk: PublicKey) -> Self {
        Self(pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_roundtrip() {
        let id = PeerId::from_bytes([7u8; 32]);
        assert_eq!(id.as_bytes(), &[7u8; 32]);
        assert_eq!(PeerId::try_from_slice(&[7u8; 32]), Some(id));
    }

    #[test]
    fn test_peer_id_rejects_wrong_length() {
        assert_eq!(PeerId::try_from_slice(&[0u8; 31]), None);
        assert_eq!(PeerId::try_from_slice(&[0u8; 33]), None);
        assert_eq!(PeerId::try_from_slice(&[]), None);
    }

    #[test]
    fn test_peer_id_display_is_hex() {
        let id = PeerId::from_bytes([0xabu8; 32]);
        assert_eq!(id.to_string(), "ab".repeat(32));
    }

    #[test]
    fn test_peer_id_serialization() {
        let id = PeerId::from_bytes([3u8; 32]);
        let json = serde_json::to_string(&id).unwrap();
        let restored: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}

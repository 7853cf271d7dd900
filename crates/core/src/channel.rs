//! Payment channel records
//!
//! On-chain bookkeeping types: channel identifiers, the single-byte channel
//! state discriminant, and per-counterparty account entries ordered by the
//! chain's `(block, tx, log)` event coordinates.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::MixCraftError;
use crate::types::{Id, PublicKey};

/// Identifier of a payment channel between two parties
///
/// Derived as SHA-256 over the lexicographically ordered party keys, so
/// both ends compute the same id regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub Id);

impl ChannelId {
    pub fn from_parties(a: &PublicKey, b: &PublicKey) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let mut hasher = Sha256::new();
        hasher.update(first);
        hasher.update(second);
        let digest = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        Self(id)
    }

    pub fn as_bytes(&self) -> &Id {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Single-byte channel state discriminant
///
/// Stored as one byte on the wire; decoding an undefined value is an
/// error, never a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChannelState {
    Closed = 0,
    Open = 1,
    PendingClosure = 2,
}

impl ChannelState {
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Result<Self, MixCraftError> {
        match byte {
            0 => Ok(ChannelState::Closed),
            1 => Ok(ChannelState::Open),
            2 => Ok(ChannelState::PendingClosure),
            other => Err(MixCraftError::InvalidChannelState(u64::from(other))),
        }
    }

    /// Contract storage keeps the state as an arbitrary-precision integer.
    pub fn to_u256(self) -> U256 {
        U256::from(self.to_byte())
    }

    pub fn from_u256(value: U256) -> Result<Self, MixCraftError> {
        let byte: u8 = value
            .try_into()
            .map_err(|_| MixCraftError::InvalidChannelState(value.saturating_to::<u64>()))?;
        Self::from_byte(byte)
    }
}

/// Per-counterparty on-chain account entry
///
/// `(block_number, tx_index, log_index)` totally orders the on-chain events
/// that produced the entry. `counter` is the ticket epoch and never
/// decreases across successive entries for the same account; the ledger
/// uses it to reject replayed or stale tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub block_number: u64,
    pub tx_index: u64,
    pub log_index: u64,
    /// Commitment to the counterparty's redemption secret
    pub hashed_secret: Id,
    /// Monotonically increasing ticket epoch
    pub counter: u64,
}

impl AccountEntry {
    pub fn new(
        block_number: u64,
        tx_index: u64,
        log_index: u64,
        hashed_secret: Id,
        counter: u64,
    ) -> Self {
        Self {
            block_number,
            tx_index,
            log_index,
            hashed_secret,
            counter,
        }
    }

    /// Total order of the on-chain events backing this entry.
    pub fn event_order(&self) -> (u64, u64, u64) {
        (self.block_number, self.tx_index, self.log_index)
    }

    /// Whether `self` supersedes `previous` without violating counter
    /// monotonicity.
    pub fn supersedes(&self, previous: &AccountEntry) -> bool {
        self.event_order() > previous.event_order() && self.counter >= previous.counter
    }
}

/// An on-chain channel contract event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEvent {
    /// Contract event name, e.g. "ChannelOpened" or "ChannelClosed"
    pub name: String,
    pub channel_id: ChannelId,
    pub state: ChannelState,
    pub block_number: u64,
    pub tx_index: u64,
    pub log_index: u64,
}

impl ChannelEvent {
    /// Position of this event in the chain's total order.
    pub fn order(&self) -> (u64, u64, u64) {
        (self.block_number, self.tx_index, self.log_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_symmetric() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_eq!(ChannelId::from_parties(&a, &b), ChannelId::from_parties(&b, &a));
    }

    #[test]
    fn test_channel_id_distinct_parties() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];
        assert_ne!(ChannelId::from_parties(&a, &b), ChannelId::from_parties(&a, &c));
    }

    #[test]
    fn test_channel_state_roundtrip() {
        for state in [
            ChannelState::Closed,
            ChannelState::Open,
            ChannelState::PendingClosure,
        ] {
            assert_eq!(ChannelState::from_byte(state.to_byte()).unwrap(), state);
            assert_eq!(ChannelState::from_u256(state.to_u256()).unwrap(), state);
        }
    }

    #[test]
    fn test_channel_state_undefined_byte_is_error() {
        for byte in 3..=u8::MAX {
            assert!(ChannelState::from_byte(byte).is_err());
        }
    }

    #[test]
    fn test_channel_state_oversized_u256_is_error() {
        assert!(ChannelState::from_u256(U256::from(256u64)).is_err());
        assert!(ChannelState::from_u256(U256::MAX).is_err());
    }

    #[test]
    fn test_channel_state_error_reports_offending_value() {
        let err = ChannelState::from_u256(U256::from(300u64)).unwrap_err();
        assert!(matches!(err, MixCraftError::InvalidChannelState(300)));

        let err = ChannelState::from_byte(9).unwrap_err();
        assert!(matches!(err, MixCraftError::InvalidChannelState(9)));

        // Values past u64 still fail, reported saturated
        let err = ChannelState::from_u256(U256::MAX).unwrap_err();
        assert!(matches!(err, MixCraftError::InvalidChannelState(u64::MAX)));
    }

    #[test]
    fn test_account_entry_event_order() {
        let entry = AccountEntry::new(10, 2, 5, [0u8; 32], 1);
        assert_eq!(entry.event_order(), (10, 2, 5));
    }

    #[test]
    fn test_account_entry_supersedes() {
        let old = AccountEntry::new(10, 2, 5, [0u8; 32], 3);
        let newer = AccountEntry::new(11, 0, 0, [0u8; 32], 3);
        assert!(newer.supersedes(&old));

        // Counter going backwards never supersedes
        let regressed = AccountEntry::new(12, 0, 0, [0u8; 32], 2);
        assert!(!regressed.supersedes(&old));

        // Same chain position never supersedes
        assert!(!old.supersedes(&old));
    }

    #[test]
    fn test_channel_event_order() {
        let event = ChannelEvent {
            name: "ChannelClosed".to_string(),
            channel_id: ChannelId::from_parties(&[1u8; 32], &[2u8; 32]),
            state: ChannelState::Closed,
            block_number: 100,
            tx_index: 3,
            log_index: 1,
        };
        assert_eq!(event.order(), (100, 3, 1));
    }
}

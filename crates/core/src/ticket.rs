//! Ticket and acknowledgement records
//!
//! A ticket is a signed, probabilistic claim on channel funds issued for a
//! single relayed hop. It only becomes redeemable once the relay's forward
//! has been acknowledged by the next hop. Both records sign a fixed-layout
//! byte string, assembled here so signer and verifier agree on offsets.

use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::balance::Balance;
use crate::channel::ChannelId;
use crate::types::{Id, PublicKey, Signature};

/// A signed probabilistic micropayment for one relayed hop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTicket {
    /// Channel this ticket draws on
    pub channel_id: ChannelId,
    /// Hash committing to the proof-of-relay secret
    pub challenge: Id,
    /// Balance transferred if the ticket wins
    pub amount: Balance,
    /// Probability that this ticket wins a draw
    pub win_prob: f64,
    /// Channel epoch the ticket was issued for
    pub epoch: u64,
    /// Issuer's public key
    pub signer: PublicKey,
    /// Issuer's ed25519 signature over [`SignedTicket::signable_data`]
    #[serde(with = "BigArray")]
    pub signature: Signature,
}

impl SignedTicket {
    /// Get the data the issuer signs (112 bytes):
    /// channel_id(32) || challenge(32) || amount_be(32) || win_prob_le(8) || epoch_le(8)
    pub fn signable_data(
        channel_id: &ChannelId,
        challenge: &Id,
        amount: &Balance,
        win_prob: f64,
        epoch: u64,
    ) -> Vec<u8> {
        let mut data = Vec::with_capacity(32 + 32 + 32 + 8 + 8);
        data.extend_from_slice(channel_id.as_bytes());
        data.extend_from_slice(challenge);
        data.extend_from_slice(&amount.to_be_bytes());
        data.extend_from_slice(&win_prob.to_le_bytes());
        data.extend_from_slice(&epoch.to_le_bytes());
        data
    }
}

/// Proof that a relayed packet was handed to the next hop
///
/// Emitted back along the reverse path after a successful forward. The
/// challenge ties the acknowledgement to the pending ticket it releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Challenge of the packet whose forward is being acknowledged
    pub challenge: Id,
    /// Acknowledging node's public key
    pub signer: PublicKey,
    /// Signature over [`Acknowledgement::signable_data`]
    #[serde(with = "BigArray")]
    pub signature: Signature,
}

impl Acknowledgement {
    /// Get the data the acknowledging node signs (64 bytes):
    /// challenge(32) || signer(32)
    pub fn signable_data(challenge: &Id, signer: &PublicKey) -> Vec<u8> {
        let mut data = Vec::with_capacity(32 + 32);
        data.extend_from_slice(challenge);
        data.extend_from_slice(signer);
        data
    }
}

use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};

use mixcraft_core::{Acknowledgement, Balance, ChannelId, Id, SignedTicket};

use crate::keys::SigningKeypair;

/// Sign data with a signing keypair
pub fn sign_data(keypair: &SigningKeypair, data: &[u8]) -> [u8; 64] {
    let signature: Signature = keypair.signing_key.sign(data);
    signature.to_bytes()
}

/// Verify a signature
pub fn verify_signature(pubkey: &[u8; 32], data: &[u8], signature: &[u8; 64]) -> bool {
    let verifying_key = match VerifyingKey::from_bytes(pubkey) {
        Ok(vk) => vk,
        Err(_) => return false,
    };

    let signature = Signature::from_bytes(signature);

    verifying_key.verify(data, &signature).is_ok()
}

/// Issue a ticket for one relayed hop.
///
/// The challenge commits to the proof-of-relay secret; the amount must not
/// exceed the channel's remaining deposit (enforced by the ledger, not
/// here). Whether the ticket actually wins its probabilistic draw is
/// decided at redemption time and is out of scope for issuance.
pub fn sign_ticket(
    keypair: &SigningKeypair,
    channel_id: ChannelId,
    challenge: Id,
    amount: Balance,
    win_prob: f64,
    epoch: u64,
) -> SignedTicket {
    let data = SignedTicket::signable_data(&channel_id, &challenge, &amount, win_prob, epoch);
    let signature = sign_data(keypair, &data);
    SignedTicket {
        channel_id,
        challenge,
        amount,
        win_prob,
        epoch,
        signer: keypair.public_key_bytes(),
        signature,
    }
}

/// Verify a ticket's signature against its embedded signer
pub fn verify_ticket(ticket: &SignedTicket) -> bool {
    let data = SignedTicket::signable_data(
        &ticket.channel_id,
        &ticket.challenge,
        &ticket.amount,
        ticket.win_prob,
        ticket.epoch,
    );
    verify_signature(&ticket.signer, &data, &ticket.signature)
}

/// Sign an acknowledgement for a successfully forwarded packet
pub fn sign_acknowledgement(keypair: &SigningKeypair, challenge: Id) -> Acknowledgement {
    let signer = keypair.public_key_bytes();
    let data = Acknowledgement::signable_data(&challenge, &signer);
    let signature = sign_data(keypair, &data);
    Acknowledgement {
        challenge,
        signer,
        signature,
    }
}

/// Verify an acknowledgement's signature against its embedded signer
pub fn verify_acknowledgement(ack: &Acknowledgement) -> bool {
    let data = Acknowledgement::signable_data(&ack.challenge, &ack.signer);
    verify_signature(&ack.signer, &data, &ack.signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = SigningKeypair::generate();
        let data = b"Hello, MixCraft!";

        let signature = sign_data(&keypair, data);
        assert!(verify_signature(
            &keypair.public_key_bytes(),
            data,
            &signature
        ));

        // Wrong data should fail
        assert!(!verify_signature(
            &keypair.public_key_bytes(),
            b"Wrong data",
            &signature
        ));
    }

    #[test]
    fn test_wrong_pubkey_fails() {
        let keypair1 = SigningKeypair::generate();
        let keypair2 = SigningKeypair::generate();
        let data = b"Test data";

        let signature = sign_data(&keypair1, data);

        assert!(!verify_signature(
            &keypair2.public_key_bytes(),
            data,
            &signature
        ));
    }

    #[test]
    fn test_ticket_sign_and_verify() {
        let keypair = SigningKeypair::generate();
        let channel_id = ChannelId::from_parties(&[1u8; 32], &keypair.public_key_bytes());

        let ticket = sign_ticket(
            &keypair,
            channel_id,
            [7u8; 32],
            Balance::tokens(10),
            0.5,
            1,
        );

        assert!(verify_ticket(&ticket));
        assert_eq!(ticket.signer, keypair.public_key_bytes());
    }

    #[test]
    fn test_tampered_ticket_fails() {
        let keypair = SigningKeypair::generate();
        let channel_id = ChannelId::from_parties(&[1u8; 32], &keypair.public_key_bytes());

        let mut ticket = sign_ticket(
            &keypair,
            channel_id,
            [7u8; 32],
            Balance::tokens(10),
            0.5,
            1,
        );
        ticket.amount = Balance::tokens(1000);

        assert!(!verify_ticket(&ticket));
    }

    #[test]
    fn test_ack_sign_and_verify() {
        let keypair = SigningKeypair::generate();
        let ack = sign_acknowledgement(&keypair, [3u8; 32]);
        assert!(verify_acknowledgement(&ack));
    }

    #[test]
    fn test_ack_forged_signer_fails() {
        let keypair = SigningKeypair::generate();
        let other = SigningKeypair::generate();

        let mut ack = sign_acknowledgement(&keypair, [3u8; 32]);
        ack.signer = other.public_key_bytes();

        assert!(!verify_acknowledgement(&ack));
    }
}

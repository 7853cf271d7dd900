//! Per-hop forwarding engine
//!
//! For every inbound packet the engine decides: locally destined payloads
//! go to the delivery sink, everything else is re-encoded and relayed
//! toward its destination. Every received packet is acknowledged back to
//! the node that sent it, but only a relayed hop leaves a pending ticket
//! behind, and only the matching acknowledgement from the next hop turns
//! that ticket into a ledger entry. A relay that could not transmit emits
//! no acknowledgement and surfaces the failure.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use mixcraft_core::{
    Acknowledgement, Balance, ChannelId, ForwardPacket, Id, MixCraftError, PacketView, PeerId,
    Result,
};
use mixcraft_crypto::{sign_acknowledgement, sign_ticket, verify_acknowledgement, SigningKeypair};
use mixcraft_settlement::TicketLedger;

use crate::pending::{PendingTickets, SeenTags};
use crate::transport::PacketTransport;

/// How the engine prices the hops it relays
#[derive(Debug, Clone)]
pub struct TicketPolicy {
    /// Value of one relayed hop
    pub amount: Balance,
    /// Winning probability embedded in issued tickets
    pub win_prob: f64,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self {
            amount: Balance::tokens(10),
            win_prob: 1.0,
        }
    }
}

/// A payload that reached its final destination on this node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredPayload {
    /// Peer the packet's sender field named
    pub sender: PeerId,
    pub payload: Vec<u8>,
}

/// Result of processing one inbound packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopOutcome {
    /// Payload was locally destined and handed to the delivery sink
    Delivered,
    /// Packet was re-encoded and transmitted toward the next hop
    Forwarded { next_hop: PeerId },
}

/// Challenge committing to a packet: SHA-256 over its full wire bytes.
///
/// Sender and receiver of a hop compute it over the same buffer, so an
/// acknowledgement's challenge matches the pending entry of the node that
/// transmitted those bytes.
pub fn packet_challenge(bytes: &[u8]) -> Id {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut challenge = [0u8; 32];
    challenge.copy_from_slice(&digest);
    challenge
}

/// The per-hop forwarding state machine
pub struct ForwardingEngine {
    me: PeerId,
    /// Relay capability: nodes without a signing key never relay or
    /// acknowledge (bootstrap-only mode)
    keypair: Option<SigningKeypair>,
    transport: Arc<dyn PacketTransport>,
    delivery: tokio::sync::mpsc::UnboundedSender<DeliveredPayload>,
    ledger: Arc<Mutex<TicketLedger>>,
    policy: TicketPolicy,
    pending: Mutex<PendingTickets>,
    seen: Mutex<SeenTags>,
    /// Highest epoch issued per channel, so concurrent unacknowledged hops
    /// never reuse one
    issued_epochs: Mutex<HashMap<ChannelId, u64>>,
}

impl ForwardingEngine {
    pub fn new(
        me: PeerId,
        keypair: Option<SigningKeypair>,
        transport: Arc<dyn PacketTransport>,
        delivery: tokio::sync::mpsc::UnboundedSender<DeliveredPayload>,
        ledger: Arc<Mutex<TicketLedger>>,
        policy: TicketPolicy,
    ) -> Self {
        Self {
            me,
            keypair,
            transport,
            delivery,
            ledger,
            policy,
            pending: Mutex::new(PendingTickets::new()),
            seen: Mutex::new(SeenTags::new()),
            issued_epochs: Mutex::new(HashMap::new()),
        }
    }

    /// Whether this node may act as a relay.
    pub fn relay_enabled(&self) -> bool {
        self.keypair.is_some()
    }

    /// Process one inbound packet from `from`.
    ///
    /// Duplicates are dropped, locally destined payloads are delivered,
    /// everything else is relayed. Transmit failures surface as
    /// `ForwardFailed` with no acknowledgement emitted.
    pub async fn handle_packet(&self, from: PeerId, bytes: &[u8]) -> Result<HopOutcome> {
        let view = PacketView::decode(bytes)?;
        let received_challenge = packet_challenge(bytes);

        if self.lock(&self.seen).test_and_set(received_challenge) {
            trace!(from = %from, "dropping duplicate packet");
            return Err(MixCraftError::DuplicatePacket);
        }

        if view.destination_id() == self.me {
            return self.deliver(from, view, received_challenge).await;
        }

        self.relay(from, view, received_challenge).await
    }

    async fn deliver(
        &self,
        from: PeerId,
        view: PacketView<'_>,
        received_challenge: Id,
    ) -> Result<HopOutcome> {
        debug!(sender = %view.sender_id(), bytes = view.payload.len(), "payload delivered");
        self.delivery
            .send(DeliveredPayload {
                sender: view.sender_id(),
                payload: view.payload.to_vec(),
            })
            .map_err(|_| MixCraftError::ConnectionClosed)?;

        // Receipt is acknowledged so the last hop's ticket can mature, but
        // no ticket is issued for self-delivery. Keyless nodes stay silent.
        if let Some(keypair) = self.keypair.as_ref() {
            let ack = sign_acknowledgement(keypair, received_challenge);
            if let Err(e) = self.transport.send_acknowledgement(from, ack).await {
                warn!(to = %from, error = %e, "failed to emit acknowledgement");
            }
        }

        Ok(HopOutcome::Delivered)
    }

    async fn relay(
        &self,
        from: PeerId,
        view: PacketView<'_>,
        received_challenge: Id,
    ) -> Result<HopOutcome> {
        let keypair = self.keypair.as_ref().ok_or(MixCraftError::RelayDisabled)?;

        let next_hop = view.destination_id();
        let forwarded = ForwardPacket::new(&next_hop, &self.me, view.payload);
        let forward_challenge = packet_challenge(forwarded.as_bytes());

        self.transport
            .send_packet(next_hop, forwarded)
            .await
            .map_err(|e| MixCraftError::ForwardFailed(e.to_string()))?;

        // The upstream channel pays for this hop; the ticket matures once
        // the next hop acknowledges the forwarded bytes.
        let channel_id = ChannelId::from_parties(self.me.as_bytes(), from.as_bytes());
        let epoch = self.next_epoch(channel_id);
        let ticket = sign_ticket(
            keypair,
            channel_id,
            forward_challenge,
            self.policy.amount,
            self.policy.win_prob,
            epoch,
        );
        self.lock(&self.pending)
            .insert(forward_challenge, channel_id, ticket, next_hop);

        // Fire-and-forget: a lost acknowledgement costs us a ticket but
        // must not fail the forward that already happened.
        let ack = sign_acknowledgement(keypair, received_challenge);
        if let Err(e) = self.transport.send_acknowledgement(from, ack).await {
            warn!(to = %from, error = %e, "failed to emit acknowledgement");
        }

        debug!(next_hop = %next_hop, epoch, "packet relayed");
        Ok(HopOutcome::Forwarded { next_hop })
    }

    /// Process an acknowledgement from a downstream hop.
    ///
    /// Resolves the pending ticket its challenge names and records it in
    /// the ledger. Unknown challenges are ignored (the pending entry may
    /// have expired); forged signatures are rejected, and so is any ack
    /// not signed by the peer the packet was forwarded to. A mismatched
    /// signer leaves the pending entry in place for the real hop's ack.
    pub async fn handle_acknowledgement(
        &self,
        ack: Acknowledgement,
    ) -> Result<Option<ChannelId>> {
        if !verify_acknowledgement(&ack) {
            return Err(MixCraftError::InvalidSignature);
        }

        let resolved = {
            let mut pending = self.lock(&self.pending);
            match pending.expected_signer(&ack.challenge) {
                None => None,
                Some(expected) if expected.as_bytes() != &ack.signer => {
                    warn!(expected = %expected, "acknowledgement from unexpected signer");
                    return Err(MixCraftError::UnexpectedAckSigner);
                }
                Some(_) => pending.resolve(&ack.challenge),
            }
        };
        let Some((channel_id, ticket)) = resolved else {
            trace!("acknowledgement for unknown or expired challenge");
            return Ok(None);
        };

        self.lock(&self.ledger).record_ticket(channel_id, ticket)?;
        debug!(channel = %channel_id, "ticket matured");
        Ok(Some(channel_id))
    }

    /// Number of forwarded hops still awaiting acknowledgement.
    pub fn pending_tickets(&self) -> usize {
        self.lock(&self.pending).len()
    }

    fn next_epoch(&self, channel_id: ChannelId) -> u64 {
        let ledger_counter = self
            .lock(&self.ledger)
            .account(channel_id)
            .map(|account| account.counter)
            .unwrap_or(0);

        let mut issued = self.lock(&self.issued_epochs);
        let next = ledger_counter.max(*issued.get(&channel_id).unwrap_or(&0)) + 1;
        issued.insert(channel_id, next);
        next
    }

    /// Locks are only held for map operations, never across an await.
    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

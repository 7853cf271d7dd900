//! Integration tests for the settlement flow
//!
//! Wires the ticket ledger and the channel event registry against a mock
//! chain client:
//! 1. Channel opening and ticket accumulation
//! 2. Contract event subscription, ordering, and dedup
//! 3. Channel-close reconciliation and ticket redemption
//! 4. Listener teardown after closure

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use mixcraft_core::{
    AccountEntry, Balance, ChannelEvent, ChannelId, ChannelState, PublicKey, Result, SignedTicket,
};
use mixcraft_crypto::{sign_ticket, SigningKeypair};
use mixcraft_settings::Settings;
use mixcraft_settlement::{ChainClient, ChannelEventRegistry, TicketLedger};

// =============================================================================
// HELPERS
// =============================================================================

/// Chain client stub: hands out channel ids, records redemptions, and lets
/// tests emit contract events into subscriptions.
struct MockChainClient {
    our_key: PublicKey,
    subscriptions: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<ChannelEvent>>>>,
    redeemed: Mutex<Vec<(ChannelId, SignedTicket)>>,
    closed: Mutex<Vec<ChannelId>>,
}

impl MockChainClient {
    fn new(our_key: PublicKey) -> Self {
        Self {
            our_key,
            subscriptions: Mutex::new(HashMap::new()),
            redeemed: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
        }
    }

    /// Emit a contract event into every matching subscription.
    fn emit(&self, event: ChannelEvent) {
        if let Some(subs) = self.subscriptions.lock().unwrap().get(&event.name) {
            for tx in subs {
                let _ = tx.send(event.clone());
            }
        }
    }

    fn redeemed_count(&self) -> usize {
        self.redeemed.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn open_channel(&self, counterparty: PublicKey, _deposit: Balance) -> Result<ChannelId> {
        Ok(ChannelId::from_parties(&self.our_key, &counterparty))
    }

    async fn close_channel(&self, channel_id: ChannelId) -> Result<()> {
        self.closed.lock().unwrap().push(channel_id);
        Ok(())
    }

    async fn redeem_ticket(&self, channel_id: ChannelId, ticket: &SignedTicket) -> Result<()> {
        self.redeemed
            .lock()
            .unwrap()
            .push((channel_id, ticket.clone()));
        Ok(())
    }

    async fn subscribe_events(
        &self,
        event_name: &str,
    ) -> Result<mpsc::UnboundedReceiver<ChannelEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriptions
            .lock()
            .unwrap()
            .entry(event_name.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}

fn closed_event(channel_id: ChannelId, block: u64, tx: u64, log: u64) -> ChannelEvent {
    ChannelEvent {
        name: "ChannelClosed".to_string(),
        channel_id,
        state: ChannelState::Closed,
        block_number: block,
        tx_index: tx,
        log_index: log,
    }
}

fn account(counter: u64) -> AccountEntry {
    AccountEntry::new(1, 0, 0, [0u8; 32], counter)
}

fn ticket(
    keypair: &SigningKeypair,
    channel_id: ChannelId,
    challenge: u8,
    amount: u64,
    epoch: u64,
) -> SignedTicket {
    sign_ticket(
        keypair,
        channel_id,
        [challenge; 32],
        Balance::tokens(amount),
        1.0,
        epoch,
    )
}

// =============================================================================
// 1. Full settlement cycle: open, accumulate, close, redeem
// =============================================================================

#[tokio::test]
async fn test_open_accumulate_close_redeem_cycle() {
    mixcraft_logging::try_init_logging();
    let keypair = SigningKeypair::generate();
    let counterparty = [7u8; 32];
    let chain = MockChainClient::new(keypair.public_key_bytes());

    // Open on-chain, then mirror the channel in the local ledger
    let channel_id = chain
        .open_channel(counterparty, Balance::tokens(100))
        .await
        .unwrap();
    let mut ledger = TicketLedger::new();
    ledger
        .open_channel(channel_id, account(0), Balance::tokens(100))
        .unwrap();

    ledger
        .record_ticket(channel_id, ticket(&keypair, channel_id, 1, 10, 1))
        .unwrap();
    ledger
        .record_ticket(channel_id, ticket(&keypair, channel_id, 2, 15, 2))
        .unwrap();
    assert_eq!(ledger.aggregate(channel_id).unwrap().total, Balance::tokens(25));

    // Watch for closure through the registry
    let mut chain_events = chain.subscribe_events("ChannelClosed").await.unwrap();
    let mut registry = ChannelEventRegistry::new();
    let (listener_tx, mut listener_rx) = mpsc::unbounded_channel();
    registry.subscribe("ChannelClosed", listener_tx);

    chain.emit(closed_event(channel_id, 50, 0, 0));
    let event = chain_events.try_recv().unwrap();
    assert!(registry.deliver(event));

    // Reconcile: retire the book and redeem every matured ticket
    let closure = listener_rx.try_recv().unwrap();
    assert_eq!(closure.channel_id, channel_id);
    let matured = ledger.close_channel(closure.channel_id).unwrap();
    assert_eq!(matured.len(), 2);
    for matured_ticket in &matured {
        chain
            .redeem_ticket(channel_id, matured_ticket)
            .await
            .unwrap();
    }
    assert_eq!(chain.redeemed_count(), 2);
    assert!(!ledger.contains(channel_id));

    // Closure tears the listeners down exactly once; doing it again is safe
    registry.unsubscribe("ChannelClosed");
    registry.unsubscribe("ChannelClosed");
    assert_eq!(registry.total_listeners(), 0);
}

// =============================================================================
// 2. Re-delivered and reordered contract events
// =============================================================================

#[tokio::test]
async fn test_redelivered_close_event_reconciles_once() {
    mixcraft_logging::try_init_logging();
    let keypair = SigningKeypair::generate();
    let channel_id = ChannelId::from_parties(&keypair.public_key_bytes(), &[7u8; 32]);

    let mut ledger = TicketLedger::new();
    ledger
        .open_channel(channel_id, account(0), Balance::tokens(100))
        .unwrap();
    ledger
        .record_ticket(channel_id, ticket(&keypair, channel_id, 1, 10, 1))
        .unwrap();

    let mut registry = ChannelEventRegistry::new();
    let (listener_tx, mut listener_rx) = mpsc::unbounded_channel();
    registry.subscribe("ChannelClosed", listener_tx);

    // The subscription re-delivers the same chain event
    assert!(registry.deliver(closed_event(channel_id, 50, 3, 1)));
    assert!(!registry.deliver(closed_event(channel_id, 50, 3, 1)));

    let mut reconciled = 0;
    while let Ok(event) = listener_rx.try_recv() {
        if ledger.close_channel(event.channel_id).is_ok() {
            reconciled += 1;
        }
    }
    assert_eq!(reconciled, 1);
}

#[tokio::test]
async fn test_stale_event_ordering_per_channel() {
    mixcraft_logging::try_init_logging();
    let channel_a = ChannelId::from_parties(&[1u8; 32], &[2u8; 32]);
    let channel_b = ChannelId::from_parties(&[1u8; 32], &[3u8; 32]);

    let mut registry = ChannelEventRegistry::new();
    let (listener_tx, mut listener_rx) = mpsc::unbounded_channel();
    registry.subscribe("ChannelClosed", listener_tx);

    assert!(registry.deliver(closed_event(channel_a, 60, 0, 0)));
    // Earlier chain position for the same channel is stale
    assert!(!registry.deliver(closed_event(channel_a, 59, 9, 9)));
    // An earlier block for a different channel is still fresh
    assert!(registry.deliver(closed_event(channel_b, 55, 0, 0)));

    assert_eq!(listener_rx.try_recv().unwrap().channel_id, channel_a);
    assert_eq!(listener_rx.try_recv().unwrap().channel_id, channel_b);
    assert!(listener_rx.try_recv().is_err());
}

// =============================================================================
// 3. Redemption threshold from node settings
// =============================================================================

#[tokio::test]
async fn test_redemption_waits_for_configured_threshold() {
    mixcraft_logging::try_init_logging();
    let keypair = SigningKeypair::generate();
    let channel_id = ChannelId::from_parties(&keypair.public_key_bytes(), &[7u8; 32]);

    let settings = Settings::default();
    let threshold = Balance::tokens(settings.settlement.redeem_threshold);

    let mut ledger = TicketLedger::new();
    ledger
        .open_channel(channel_id, account(0), Balance::tokens(200))
        .unwrap();

    // 90 of the 100-token threshold accumulated: not yet worth the gas
    for epoch in 1..=9 {
        ledger
            .record_ticket(channel_id, ticket(&keypair, channel_id, epoch as u8, 10, epoch))
            .unwrap();
    }
    assert!(!ledger.redeemable(channel_id, &threshold));

    ledger
        .record_ticket(channel_id, ticket(&keypair, channel_id, 10, 10, 10))
        .unwrap();
    assert!(ledger.redeemable(channel_id, &threshold));
}

// =============================================================================
// 4. Teardown leaves no listeners behind
// =============================================================================

#[tokio::test]
async fn test_unsubscribe_all_after_multiple_channels() {
    mixcraft_logging::try_init_logging();
    let mut registry = ChannelEventRegistry::new();

    let mut receivers = Vec::new();
    for name in ["ChannelOpened", "ChannelClosed", "TicketRedeemed"] {
        for _ in 0..3 {
            let (tx, rx) = mpsc::unbounded_channel();
            registry.subscribe(name, tx);
            receivers.push(rx);
        }
    }
    assert_eq!(registry.total_listeners(), 9);

    registry.unsubscribe_all();
    assert_eq!(registry.total_listeners(), 0);

    // Events after teardown reach nobody
    let channel_id = ChannelId::from_parties(&[1u8; 32], &[2u8; 32]);
    registry.deliver(closed_event(channel_id, 10, 0, 0));
    for rx in &mut receivers {
        assert!(rx.try_recv().is_err());
    }
}

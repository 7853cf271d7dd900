//! Chain collaborator surface
//!
//! Everything this crate needs from the channel smart contract, expressed
//! as one trait. Contract deployment, transaction assembly, and RPC
//! details live behind implementations of this trait.

use async_trait::async_trait;
use tokio::sync::mpsc;

use mixcraft_core::{Balance, ChannelEvent, ChannelId, PublicKey, Result, SignedTicket};

/// Operations against the on-chain payment channel contract
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Open a channel towards a counterparty with an initial deposit,
    /// returning the channel id assigned on-chain.
    async fn open_channel(&self, counterparty: PublicKey, deposit: Balance) -> Result<ChannelId>;

    /// Initiate closure of a channel.
    async fn close_channel(&self, channel_id: ChannelId) -> Result<()>;

    /// Submit a matured ticket for on-chain redemption.
    async fn redeem_ticket(&self, channel_id: ChannelId, ticket: &SignedTicket) -> Result<()>;

    /// Subscribe to contract events by name; events arrive in chain order
    /// on the returned receiver.
    async fn subscribe_events(
        &self,
        event_name: &str,
    ) -> Result<mpsc::UnboundedReceiver<ChannelEvent>>;
}

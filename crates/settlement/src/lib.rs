//! MixCraft Settlement
//!
//! Off-chain bookkeeping for on-chain payment channels: the per-channel
//! ticket ledger, the channel contract event registry, and the trait
//! surface towards the chain collaborator. Contract internals never leak
//! past [`ChainClient`].

mod client;
mod events;
mod ledger;

pub use client::ChainClient;
pub use events::{ChannelEventRegistry, ListenerHandle};
pub use ledger::{TicketAggregate, TicketLedger};

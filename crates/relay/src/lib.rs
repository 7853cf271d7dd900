//! MixCraft Relay
//!
//! The per-hop forwarding state machine: decode an inbound packet, deliver
//! it locally or relay it onward, acknowledge successful forwards, and turn
//! acknowledged hops into ledger-recorded tickets.

mod engine;
mod pending;
mod transport;

pub use engine::{packet_challenge, DeliveredPayload, ForwardingEngine, HopOutcome, TicketPolicy};
pub use pending::{PendingTickets, SeenTags};
pub use transport::PacketTransport;

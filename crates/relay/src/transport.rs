//! Transport collaborator surface
//!
//! The engine never constructs sockets. Whatever carries bytes between
//! peers (direct connections or relayed streams) implements this trait;
//! retry and backoff policy live there, not in the engine.

use async_trait::async_trait;

use mixcraft_core::{Acknowledgement, ForwardPacket, PeerId, Result};

/// Outbound surface the forwarding engine writes to
#[async_trait]
pub trait PacketTransport: Send + Sync {
    /// Hand a packet to the connection layer for delivery to the next hop.
    ///
    /// An error means the packet was not transmitted; the engine surfaces
    /// it as `ForwardFailed` and does not retry.
    async fn send_packet(&self, next_hop: PeerId, packet: ForwardPacket) -> Result<()>;

    /// Send an acknowledgement back along the reverse path.
    async fn send_acknowledgement(&self, to: PeerId, ack: Acknowledgement) -> Result<()>;
}

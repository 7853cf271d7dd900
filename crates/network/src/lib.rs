//! MixCraft Network
//!
//! Reachability and connection plumbing around the forwarding core:
//!
//! - STUN-based probing of NAT exposure (UDP and TCP)
//! - Relayed connection adapter for peers without direct reachability
//! - Passive peer discovery feeding the connection layer

mod discovery;
mod error;
mod nat;
mod relayed;
pub mod stun;

pub use discovery::{PeerAnnouncement, PeerDiscovery};
pub use error::{NetworkError, Result};
pub use nat::{
    Exposure, NatProbe, ServerList, TCP_SERVERS_V1, TCP_TIMEOUT, UDP_SERVERS_V1, UDP_TIMEOUT,
};
pub use relayed::RelayedConnection;

//! MixCraft Crypto
//!
//! Identity and signing primitives: ed25519 node keypairs plus ticket and
//! acknowledgement signing. Onion-layer encryption is deliberately not
//! provided here; packet framing treats the payload as opaque bytes.

mod keys;
mod sign;

pub use keys::*;
pub use sign::*;

//! MixCraft Core Types
//!
//! This crate defines the fundamental data structures used throughout MixCraft:
//! peer identifiers, the forward packet wire format, and balance types.

mod balance;
mod channel;
mod error;
mod packet;
mod ticket;
mod types;

pub use balance::*;
pub use channel::*;
pub use error::*;
pub use packet::*;
pub use ticket::*;
pub use types::*;

//! Forward packet wire format
//!
//! Fixed-layout framing for one relay hop:
//!
//! ```text
//! | sender (32) | destination (32) | payload (..) |
//! ```
//!
//! Total length is always `64 + payload.len()`; there is no padding and no
//! implicit truncation. [`ForwardPacket`] owns its buffer while
//! [`PacketView`] borrows one; both use identical field offsets, so a packet
//! assembled fresh and a packet re-interpreted from received bytes look the
//! same.

use crate::error::MixCraftError;
use crate::types::{PeerId, PEER_ID_LENGTH};

/// Byte offset of the sender field
const SENDER_OFFSET: usize = 0;

/// Byte offset of the destination field
const DESTINATION_OFFSET: usize = PEER_ID_LENGTH;

/// Minimum packet length: two peer identifiers, empty payload
pub const PACKET_HEADER_LENGTH: usize = 2 * PEER_ID_LENGTH;

/// An owned forward packet buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardPacket {
    buf: Vec<u8>,
}

impl ForwardPacket {
    /// Assemble a fresh packet from its parts.
    pub fn new(destination: &PeerId, sender: &PeerId, payload: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(PACKET_HEADER_LENGTH + payload.len());
        buf.extend_from_slice(sender.as_bytes());
        buf.extend_from_slice(destination.as_bytes());
        buf.extend_from_slice(payload);
        Self { buf }
    }

    /// Take ownership of a received buffer, validating the header length.
    pub fn from_bytes(buf: Vec<u8>) -> Result<Self, MixCraftError> {
        if buf.len() < PACKET_HEADER_LENGTH {
            return Err(MixCraftError::MalformedPacket {
                got: buf.len(),
                min: PACKET_HEADER_LENGTH,
            });
        }
        Ok(Self { buf })
    }

    /// Borrow the packet as a zero-copy view.
    pub fn view(&self) -> PacketView<'_> {
        // Length was validated at construction
        PacketView::decode(&self.buf).unwrap_or_else(|_| unreachable!())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// A zero-copy view into a forward packet buffer
///
/// Field references point into the backing buffer; the view cannot outlive
/// it. Decoding never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketView<'a> {
    pub sender: &'a [u8; PEER_ID_LENGTH],
    pub destination: &'a [u8; PEER_ID_LENGTH],
    pub payload: &'a [u8],
}

impl<'a> PacketView<'a> {
    /// Re-interpret a byte buffer as a forward packet.
    ///
    /// Fails with `MalformedPacket` when the buffer is shorter than the
    /// two-identifier header. The payload is the remainder of the buffer
    /// and may be empty.
    pub fn decode(buf: &'a [u8]) -> Result<Self, MixCraftError> {
        if buf.len() < PACKET_HEADER_LENGTH {
            return Err(MixCraftError::MalformedPacket {
                got: buf.len(),
                min: PACKET_HEADER_LENGTH,
            });
        }

        // Slices are exactly PEER_ID_LENGTH, conversion cannot fail
        let sender: &[u8; PEER_ID_LENGTH] = buf[SENDER_OFFSET..SENDER_OFFSET + PEER_ID_LENGTH]
            .try_into()
            .unwrap_or_else(|_| unreachable!());
        let destination: &[u8; PEER_ID_LENGTH] = buf
            [DESTINATION_OFFSET..DESTINATION_OFFSET + PEER_ID_LENGTH]
            .try_into()
            .unwrap_or_else(|_| unreachable!());

        Ok(Self {
            sender,
            destination,
            payload: &buf[PACKET_HEADER_LENGTH..],
        })
    }

    pub fn sender_id(&self) -> PeerId {
        PeerId(*self.sender)
    }

    pub fn destination_id(&self) -> PeerId {
        PeerId(*self.destination)
    }

    /// Copy the view into an owned packet.
    pub fn to_owned_packet(&self) -> ForwardPacket {
        ForwardPacket::new(&self.destination_id(), &self.sender_id(), self.payload)
    }
}

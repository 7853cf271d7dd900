//! STUN binding message codec (RFC 5389)
//!
//! Only the subset the reachability probe needs: binding requests, binding
//! responses carrying MAPPED-ADDRESS or XOR-MAPPED-ADDRESS, and the stream
//! framing used when the same messages travel over TCP. Nothing here opens
//! sockets.

use std::net::{IpAddr, SocketAddr};

use rand::Rng;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{NetworkError, Result};

pub const BINDING_REQUEST: u16 = 0x0001;
pub const BINDING_RESPONSE: u16 = 0x0101;
pub const BINDING_ERROR: u16 = 0x0111;

const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;

/// RFC 5389 magic cookie
pub const MAGIC_COOKIE: u32 = 0x2112A442;

/// Header is always 20 bytes: type, length, cookie, transaction id
pub const HEADER_LENGTH: usize = 20;

const FAMILY_IPV4: u8 = 0x01;
const FAMILY_IPV6: u8 = 0x02;

pub type TransactionId = [u8; 12];

pub fn new_transaction_id() -> TransactionId {
    let mut id = [0u8; 12];
    rand::thread_rng().fill(&mut id);
    id
}

/// Build a binding request with no attributes (20 bytes).
pub fn build_binding_request(transaction_id: &TransactionId) -> Vec<u8> {
    let mut msg = Vec::with_capacity(HEADER_LENGTH);
    msg.extend_from_slice(&BINDING_REQUEST.to_be_bytes());
    msg.extend_from_slice(&0u16.to_be_bytes());
    msg.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
    msg.extend_from_slice(transaction_id);
    msg
}

/// Build a binding response carrying `mapped` as XOR-MAPPED-ADDRESS.
pub fn build_binding_response(transaction_id: &TransactionId, mapped: SocketAddr) -> Vec<u8> {
    let xor_port = mapped.port() ^ (MAGIC_COOKIE >> 16) as u16;
    let (family, ip_bytes): (u8, Vec<u8>) = match mapped.ip() {
        IpAddr::V4(ip) => {
            let mut bytes = ip.octets().to_vec();
            for (byte, key) in bytes.iter_mut().zip(MAGIC_COOKIE.to_be_bytes()) {
                *byte ^= key;
            }
            (FAMILY_IPV4, bytes)
        }
        IpAddr::V6(ip) => {
            let mut bytes = ip.octets().to_vec();
            let mut key = [0u8; 16];
            key[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
            key[4..].copy_from_slice(transaction_id);
            for (byte, key) in bytes.iter_mut().zip(key) {
                *byte ^= key;
            }
            (FAMILY_IPV6, bytes)
        }
    };

    let attr_len = 4 + ip_bytes.len();
    let mut msg = Vec::with_capacity(HEADER_LENGTH + 4 + attr_len);
    msg.extend_from_slice(&BINDING_RESPONSE.to_be_bytes());
    msg.extend_from_slice(&((4 + attr_len) as u16).to_be_bytes());
    msg.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
    msg.extend_from_slice(transaction_id);

    msg.extend_from_slice(&ATTR_XOR_MAPPED_ADDRESS.to_be_bytes());
    msg.extend_from_slice(&(attr_len as u16).to_be_bytes());
    msg.push(0);
    msg.push(family);
    msg.extend_from_slice(&xor_port.to_be_bytes());
    msg.extend_from_slice(&ip_bytes);

    msg
}

/// Parse a binding response and extract the reflexive transport address.
///
/// Responses whose cookie, transaction id, or message type do not match are
/// rejected. XOR-MAPPED-ADDRESS wins over plain MAPPED-ADDRESS when both
/// are present.
pub fn parse_binding_response(
    data: &[u8],
    expected_txn_id: &TransactionId,
) -> Result<SocketAddr> {
    if data.len() < HEADER_LENGTH {
        return Err(NetworkError::Protocol("response shorter than header".into()));
    }

    let msg_type = u16::from_be_bytes([data[0], data[1]]);
    let msg_len = u16::from_be_bytes([data[2], data[3]]) as usize;
    let cookie = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);

    if cookie != MAGIC_COOKIE {
        return Err(NetworkError::Protocol("bad magic cookie".into()));
    }
    if &data[8..20] != expected_txn_id {
        return Err(NetworkError::Protocol("transaction id mismatch".into()));
    }
    if msg_type == BINDING_ERROR {
        return Err(NetworkError::Protocol("binding error response".into()));
    }
    if msg_type != BINDING_RESPONSE {
        return Err(NetworkError::Protocol(format!(
            "unexpected message type 0x{msg_type:04x}"
        )));
    }
    if data.len() < HEADER_LENGTH + msg_len {
        return Err(NetworkError::Protocol("truncated response".into()));
    }

    let mut mapped: Option<SocketAddr> = None;
    let mut pos = HEADER_LENGTH;
    while pos + 4 <= HEADER_LENGTH + msg_len {
        let attr_type = u16::from_be_bytes([data[pos], data[pos + 1]]);
        let attr_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        pos += 4;
        if pos + attr_len > data.len() {
            break;
        }
        let attr = &data[pos..pos + attr_len];

        match attr_type {
            ATTR_XOR_MAPPED_ADDRESS => {
                if let Some(addr) = decode_address(attr, true, expected_txn_id) {
                    mapped = Some(addr);
                }
            }
            ATTR_MAPPED_ADDRESS => {
                if let Some(addr) = decode_address(attr, false, expected_txn_id) {
                    mapped.get_or_insert(addr);
                }
            }
            _ => {}
        }

        // Attributes are padded to 4-byte boundaries
        pos += (attr_len + 3) & !3;
    }

    mapped.ok_or_else(|| NetworkError::Protocol("no mapped address attribute".into()))
}

fn decode_address(attr: &[u8], xor: bool, transaction_id: &TransactionId) -> Option<SocketAddr> {
    if attr.len() < 8 {
        return None;
    }

    let family = attr[1];
    let mut port = u16::from_be_bytes([attr[2], attr[3]]);
    if xor {
        port ^= (MAGIC_COOKIE >> 16) as u16;
    }

    match family {
        FAMILY_IPV4 => {
            let mut octets = [attr[4], attr[5], attr[6], attr[7]];
            if xor {
                for (byte, key) in octets.iter_mut().zip(MAGIC_COOKIE.to_be_bytes()) {
                    *byte ^= key;
                }
            }
            Some(SocketAddr::new(std::net::Ipv4Addr::from(octets).into(), port))
        }
        FAMILY_IPV6 => {
            if attr.len() < 20 {
                return None;
            }
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&attr[4..20]);
            if xor {
                let mut key = [0u8; 16];
                key[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
                key[4..].copy_from_slice(transaction_id);
                for (byte, key) in octets.iter_mut().zip(key) {
                    *byte ^= key;
                }
            }
            Some(SocketAddr::new(std::net::Ipv6Addr::from(octets).into(), port))
        }
        _ => None,
    }
}

/// Read one complete STUN message off a byte stream.
///
/// TCP carries the same messages back to back; the 20-byte header's length
/// field tells us how much attribute data follows.
pub async fn read_stream_message<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_LENGTH];
    stream.read_exact(&mut header).await?;

    let msg_len = u16::from_be_bytes([header[2], header[3]]) as usize;
    let mut msg = vec![0u8; HEADER_LENGTH + msg_len];
    msg[..HEADER_LENGTH].copy_from_slice(&header);
    stream.read_exact(&mut msg[HEADER_LENGTH..]).await?;

    Ok(msg)
}

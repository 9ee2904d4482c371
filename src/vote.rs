//! Vote messages
//!
//! A vote names up to three peers in rank order, best first, as compact
//! 6-byte endpoints under the `added` key of a bencoded dictionary. Only
//! IPv4 endpoints exist on the wire.

use crate::bencode::{self, Value};
use crate::constants::{COMPACT_ENDPOINT_LEN, MAX_ADDED_LEN};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddrV4};
use thiserror::Error;

/// Why a received vote payload was rejected.
///
/// None of these are fatal to the connection; the receiver drops the single
/// message and moves on.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("bencode error: {0}")]
    Bencode(#[from] bencode::BencodeError),

    #[error("vote payload is not a dictionary")]
    ExpectedDict,

    #[error("missing \"added\" byte string")]
    MissingAdded,

    #[error("\"added\" length {0} is not a multiple of 6")]
    UnevenLength(usize),

    #[error("vote names {0} peers, limit is 3")]
    TooManyPeers(usize),
}

/// A peer vote, ordered best-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteMessage {
    /// Reported endpoints in rank order; index 0 carries the most weight.
    pub peers: Vec<SocketAddrV4>,
}

impl VoteMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes the vote as its wire payload, a bencoded `{"added": ...}`
    /// dictionary.
    pub fn encode(&self) -> Bytes {
        let mut dict = BTreeMap::new();
        dict.insert(
            Bytes::from_static(b"added"),
            Value::Bytes(encode_endpoints(&self.peers)),
        );
        bencode::encode(&Value::Dict(dict))
    }

    /// Decodes a wire payload, enforcing the entry cap before any endpoint
    /// is materialized.
    pub fn decode(data: &[u8]) -> Result<Self, VoteError> {
        let value = bencode::decode(data)?;
        let dict = value.as_dict().ok_or(VoteError::ExpectedDict)?;

        let added = dict
            .get(b"added".as_slice())
            .and_then(|v| v.as_bytes())
            .ok_or(VoteError::MissingAdded)?;

        if added.len() % COMPACT_ENDPOINT_LEN != 0 {
            return Err(VoteError::UnevenLength(added.len()));
        }

        if added.len() > MAX_ADDED_LEN {
            return Err(VoteError::TooManyPeers(added.len() / COMPACT_ENDPOINT_LEN));
        }

        Ok(Self {
            peers: decode_endpoints(added),
        })
    }
}

/// Encodes endpoints in compact form, preserving order.
pub fn encode_endpoints(peers: &[SocketAddrV4]) -> Bytes {
    let mut buf = BytesMut::with_capacity(peers.len() * COMPACT_ENDPOINT_LEN);
    for addr in peers {
        buf.put_slice(&addr.ip().octets());
        buf.put_u16(addr.port());
    }
    buf.freeze()
}

/// Decodes compact endpoints. Trailing bytes short of a full entry are
/// ignored; the slice is never read past its end.
pub fn decode_endpoints(data: &[u8]) -> Vec<SocketAddrV4> {
    data.chunks_exact(COMPACT_ENDPOINT_LEN)
        .map(|chunk| {
            let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
            let port = u16::from_be_bytes([chunk[4], chunk[5]]);
            SocketAddrV4::new(ip, port)
        })
        .collect()
}

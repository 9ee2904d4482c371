//! Extension protocol surface (BEP-10)
//!
//! The generic negotiation framework lives in the host engine; this module
//! carries only what the vote mechanism needs from it — the handshake that
//! maps extension names to message ids, and the extended-message envelope.

use crate::bencode::{self, Value};
use crate::constants::EXTENDED_MESSAGE_ID;
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("handshake is not a dictionary")]
    ExpectedDict,

    #[error("bencode error: {0}")]
    Bencode(#[from] bencode::BencodeError),
}

/// The BEP-10 extension handshake, reduced to the fields this crate reads.
#[derive(Debug, Clone, Default)]
pub struct ExtensionHandshake {
    /// Extension name to message id, the handshake's `m` dictionary.
    pub extensions: BTreeMap<String, u8>,
    /// Client name and version, the handshake's `v` field.
    pub client: Option<String>,
}

impl ExtensionHandshake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(extensions: &[(&str, u8)]) -> Self {
        let mut handshake = Self::new();
        for (name, id) in extensions {
            handshake.extensions.insert((*name).to_string(), *id);
        }
        handshake
    }

    pub fn encode(&self) -> Bytes {
        let mut m = BTreeMap::new();
        for (name, id) in &self.extensions {
            m.insert(
                Bytes::copy_from_slice(name.as_bytes()),
                Value::Integer(*id as i64),
            );
        }

        let mut dict = BTreeMap::new();
        dict.insert(Bytes::from_static(b"m"), Value::Dict(m));
        if let Some(ref client) = self.client {
            dict.insert(Bytes::from_static(b"v"), Value::string(client));
        }

        bencode::encode(&Value::Dict(dict))
    }

    pub fn decode(data: &[u8]) -> Result<Self, ExtensionError> {
        let value = bencode::decode(data)?;
        let dict = value.as_dict().ok_or(ExtensionError::ExpectedDict)?;

        let mut handshake = Self::new();

        if let Some(m) = dict.get(b"m".as_slice()).and_then(|v| v.as_dict()) {
            for (key, val) in m {
                if let (Ok(name), Some(id)) = (std::str::from_utf8(key), val.as_integer()) {
                    // Id 0 disables an extension the remote once offered.
                    if (1..=u8::MAX as i64).contains(&id) {
                        handshake.extensions.insert(name.to_string(), id as u8);
                    }
                }
            }
        }

        handshake.client = dict
            .get(b"v".as_slice())
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(handshake)
    }

    /// Message id the remote assigned to `name`, when offered.
    pub fn extension_id(&self, name: &str) -> Option<u8> {
        self.extensions.get(name).copied()
    }
}

/// Frames an extension payload for the base wire protocol: 4-byte length,
/// the extended message tag, the negotiated extension id, then the payload.
pub fn frame_extended(extension_id: u8, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(6 + payload.len());
    buf.put_u32(2 + payload.len() as u32);
    buf.put_u8(EXTENDED_MESSAGE_ID);
    buf.put_u8(extension_id);
    buf.put_slice(payload);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_EXTENSION_ID, EXTENSION_NAME};

    #[test]
    fn test_handshake_round_trip() {
        let mut handshake =
            ExtensionHandshake::with_extensions(&[(EXTENSION_NAME, DEFAULT_EXTENSION_ID)]);
        handshake.client = Some("rbit/0.1".to_string());

        let decoded = ExtensionHandshake::decode(&handshake.encode()).unwrap();
        assert_eq!(
            decoded.extension_id(EXTENSION_NAME),
            Some(DEFAULT_EXTENSION_ID)
        );
        assert_eq!(decoded.client, Some("rbit/0.1".to_string()));
    }

    #[test]
    fn test_handshake_ignores_disabled_extensions() {
        let handshake = ExtensionHandshake::decode(b"d1:md9:peer_idoli0eee").unwrap();
        assert_eq!(handshake.extension_id(EXTENSION_NAME), None);
    }

    #[test]
    fn test_handshake_rejects_non_dict() {
        assert!(matches!(
            ExtensionHandshake::decode(b"le"),
            Err(ExtensionError::ExpectedDict)
        ));
    }

    #[test]
    fn test_frame_layout() {
        let frame = frame_extended(23, b"d5:added0:e");

        assert_eq!(
            u32::from_be_bytes(frame[..4].try_into().unwrap()),
            2 + 11
        );
        assert_eq!(frame[4], EXTENDED_MESSAGE_ID);
        assert_eq!(frame[5], 23);
        assert_eq!(&frame[6..], b"d5:added0:e");
    }

    #[test]
    fn test_frame_empty_payload() {
        let frame = frame_extended(1, b"");
        assert_eq!(&frame[..], &[0, 0, 0, 2, 20, 1]);
    }
}

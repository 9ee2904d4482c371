//! Bencode encoding/decoding (BEP-3)
//!
//! The extension carries its payloads in bencoded dictionaries, the
//! structured encoding used throughout the BitTorrent protocol family.
//! Decoding is strict: trailing data, malformed integers, and over-deep
//! nesting are rejected, and the decoder never reads past the input slice.

use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use thiserror::Error;

const MAX_DEPTH: usize = 32;

#[derive(Debug, Error)]
pub enum BencodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid integer")]
    InvalidInteger,

    #[error("invalid string length")]
    InvalidLength,

    #[error("unexpected byte: 0x{0:02x}")]
    UnexpectedByte(u8),

    #[error("trailing data after value")]
    TrailingData,

    #[error("nesting too deep")]
    TooDeep,
}

/// A bencode value: integer, byte string, list, or dictionary.
///
/// Dictionary keys are raw byte strings kept in a `BTreeMap`, so encoding
/// always produces the canonical sorted-key form.
///
/// # Examples
///
/// ```
/// use peer_idol::bencode::{decode, Value};
///
/// let value = decode(b"d5:added5:peerse").unwrap();
/// assert_eq!(value.get(b"added").and_then(|v| v.as_str()), Some("peers"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Bytes(Bytes),
    List(Vec<Value>),
    Dict(BTreeMap<Bytes, Value>),
}

impl Value {
    /// Creates a byte string value from a UTF-8 string.
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as a UTF-8 string, if it is a valid UTF-8 byte
    /// string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Bytes, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up a key in this value if it is a dictionary.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?.get(key)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

/// Encodes a value in canonical bencode form.
///
/// # Examples
///
/// ```
/// use peer_idol::bencode::{encode, Value};
///
/// assert_eq!(&encode(&Value::Integer(42))[..], b"i42e");
/// assert_eq!(&encode(&Value::string("added"))[..], b"5:added");
/// ```
pub fn encode(value: &Value) -> Bytes {
    let mut buf = BytesMut::new();
    encode_into(value, &mut buf);
    buf.freeze()
}

fn encode_into(value: &Value, buf: &mut BytesMut) {
    match value {
        Value::Integer(i) => {
            buf.put_u8(b'i');
            buf.put_slice(i.to_string().as_bytes());
            buf.put_u8(b'e');
        }
        Value::Bytes(b) => {
            buf.put_slice(b.len().to_string().as_bytes());
            buf.put_u8(b':');
            buf.put_slice(b);
        }
        Value::List(items) => {
            buf.put_u8(b'l');
            for item in items {
                encode_into(item, buf);
            }
            buf.put_u8(b'e');
        }
        Value::Dict(entries) => {
            buf.put_u8(b'd');
            for (key, val) in entries {
                buf.put_slice(key.len().to_string().as_bytes());
                buf.put_u8(b':');
                buf.put_slice(key);
                encode_into(val, buf);
            }
            buf.put_u8(b'e');
        }
    }
}

/// Decodes a single bencode value spanning the whole input.
pub fn decode(data: &[u8]) -> Result<Value, BencodeError> {
    let mut parser = Parser { data, pos: 0 };
    let value = parser.value(0)?;

    if parser.pos != data.len() {
        return Err(BencodeError::TrailingData);
    }

    Ok(value)
}

struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Result<u8, BencodeError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEof)
    }

    /// Consumes bytes up to (not including) the next `delim`.
    fn until(&mut self, delim: u8) -> Result<&[u8], BencodeError> {
        let start = self.pos;
        while self.peek()? != delim {
            self.pos += 1;
        }
        let slice = &self.data[start..self.pos];
        self.pos += 1;
        Ok(slice)
    }

    fn value(&mut self, depth: usize) -> Result<Value, BencodeError> {
        if depth > MAX_DEPTH {
            return Err(BencodeError::TooDeep);
        }

        match self.peek()? {
            b'i' => self.integer(),
            b'l' => self.list(depth),
            b'd' => self.dict(depth),
            b'0'..=b'9' => self.byte_string(),
            other => Err(BencodeError::UnexpectedByte(other)),
        }
    }

    fn integer(&mut self) -> Result<Value, BencodeError> {
        self.pos += 1;
        let digits = self.until(b'e')?;

        let text = std::str::from_utf8(digits).map_err(|_| BencodeError::InvalidInteger)?;
        if text.is_empty() || text == "-" {
            return Err(BencodeError::InvalidInteger);
        }

        // "i-0e" and padded forms like "i042e" are not canonical.
        let magnitude = text.strip_prefix('-').unwrap_or(text);
        if magnitude.len() > 1 && magnitude.starts_with('0') {
            return Err(BencodeError::InvalidInteger);
        }
        if magnitude == "0" && text.starts_with('-') {
            return Err(BencodeError::InvalidInteger);
        }

        let value = text.parse().map_err(|_| BencodeError::InvalidInteger)?;
        Ok(Value::Integer(value))
    }

    fn byte_string(&mut self) -> Result<Value, BencodeError> {
        let digits = self.until(b':')?;
        let text = std::str::from_utf8(digits).map_err(|_| BencodeError::InvalidLength)?;
        let len: usize = text.parse().map_err(|_| BencodeError::InvalidLength)?;

        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(BencodeError::UnexpectedEof)?;

        let bytes = Bytes::copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(Value::Bytes(bytes))
    }

    fn list(&mut self, depth: usize) -> Result<Value, BencodeError> {
        self.pos += 1;
        let mut items = Vec::new();

        while self.peek()? != b'e' {
            items.push(self.value(depth + 1)?);
        }

        self.pos += 1;
        Ok(Value::List(items))
    }

    fn dict(&mut self, depth: usize) -> Result<Value, BencodeError> {
        self.pos += 1;
        let mut entries = BTreeMap::new();

        while self.peek()? != b'e' {
            let key = match self.value(depth + 1)? {
                Value::Bytes(b) => b,
                _ => return Err(BencodeError::UnexpectedByte(self.data[self.pos - 1])),
            };
            let value = self.value(depth + 1)?;
            entries.insert(key, value);
        }

        self.pos += 1;
        Ok(Value::Dict(entries))
    }
}

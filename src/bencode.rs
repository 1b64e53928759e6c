// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]

//! Minimal bencode value model with canonical (lexicographically key-sorted)
//! encoding, used by the Syndie URI codec.

use std::collections::BTreeMap;
use thiserror::Error;

/// Bencode decode/encode failures.
#[derive(Debug, Error)]
pub enum BencodeError {
    /// Input ended before a value was fully read.
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// A length or integer field was not valid ASCII decimal.
    #[error("invalid integer")]
    InvalidInteger,
    /// A byte-string length prefix did not match the data that followed.
    #[error("invalid byte string length")]
    InvalidByteString,
    /// A type tag byte was not `i`, `l`, `d`, or an ASCII digit.
    #[error("unrecognized value tag {0:#04x}")]
    UnrecognizedTag(u8),
    /// A dictionary key was not a byte string.
    #[error("dictionary key must be a byte string")]
    NonStringKey,
    /// Trailing bytes remained after a complete value was decoded.
    #[error("trailing bytes after value")]
    TrailingBytes,
}

/// A bencode value: integer, byte string, list, or dictionary.
///
/// Dictionaries are backed by a `BTreeMap` so encoding is always
/// lexicographically key-ordered without an explicit sort step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// A signed integer (`i<N>e`).
    Int(i64),
    /// An opaque byte string (`<len>:<bytes>`).
    Bytes(Vec<u8>),
    /// An ordered list of values (`l...e`).
    List(Vec<Value>),
    /// A dictionary keyed by byte string (`d...e`), always encoded in key order.
    Dict(BTreeMap<Vec<u8>, Value>),
}

impl Value {
    /// Returns this value as a byte string, if it is one.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns this value as a dictionary, if it is one.
    pub fn as_dict(&self) -> Option<&BTreeMap<Vec<u8>, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }
}

/// Encodes a value in canonical bencode form.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(n) => {
            out.push(b'i');
            out.extend_from_slice(n.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Bytes(b) => {
            out.extend_from_slice(b.len().to_string().as_bytes());
            out.push(b':');
            out.extend_from_slice(b);
        }
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(map) => {
            out.push(b'd');
            for (k, v) in map.iter() {
                encode_into(&Value::Bytes(k.clone()), out);
                encode_into(v, out);
            }
            out.push(b'e');
        }
    }
}

/// Decodes a single bencode value, requiring the entire input to be consumed.
pub fn decode(input: &[u8]) -> Result<Value, BencodeError> {
    let mut pos = 0usize;
    let value = decode_value(input, &mut pos)?;
    if pos != input.len() {
        return Err(BencodeError::TrailingBytes);
    }
    Ok(value)
}

fn decode_value(input: &[u8], pos: &mut usize) -> Result<Value, BencodeError> {
    let tag = *input.get(*pos).ok_or(BencodeError::UnexpectedEnd)?;
    match tag {
        b'i' => decode_int(input, pos),
        b'l' => decode_list(input, pos),
        b'd' => decode_dict(input, pos),
        b'0'..=b'9' => decode_bytes(input, pos).map(Value::Bytes),
        other => Err(BencodeError::UnrecognizedTag(other)),
    }
}

fn decode_int(input: &[u8], pos: &mut usize) -> Result<Value, BencodeError> {
    debug_assert_eq!(input[*pos], b'i');
    *pos += 1;
    let start = *pos;
    while input.get(*pos).copied().map(|b| b != b'e').unwrap_or(false) {
        *pos += 1;
    }
    if *pos >= input.len() {
        return Err(BencodeError::UnexpectedEnd);
    }
    let digits = std::str::from_utf8(&input[start..*pos]).map_err(|_| BencodeError::InvalidInteger)?;
    let n: i64 = digits.parse().map_err(|_| BencodeError::InvalidInteger)?;
    *pos += 1; // consume 'e'
    Ok(Value::Int(n))
}

fn decode_bytes(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, BencodeError> {
    let start = *pos;
    while input.get(*pos).copied().map(|b| b != b':').unwrap_or(false) {
        *pos += 1;
    }
    if *pos >= input.len() {
        return Err(BencodeError::UnexpectedEnd);
    }
    let digits = std::str::from_utf8(&input[start..*pos]).map_err(|_| BencodeError::InvalidByteString)?;
    let len: usize = digits.parse().map_err(|_| BencodeError::InvalidByteString)?;
    *pos += 1; // consume ':'
    let end = pos.checked_add(len).ok_or(BencodeError::InvalidByteString)?;
    let bytes = input.get(*pos..end).ok_or(BencodeError::UnexpectedEnd)?.to_vec();
    *pos = end;
    Ok(bytes)
}

fn decode_list(input: &[u8], pos: &mut usize) -> Result<Value, BencodeError> {
    debug_assert_eq!(input[*pos], b'l');
    *pos += 1;
    let mut items = Vec::new();
    loop {
        match input.get(*pos) {
            Some(b'e') => {
                *pos += 1;
                break;
            }
            Some(_) => items.push(decode_value(input, pos)?),
            None => return Err(BencodeError::UnexpectedEnd),
        }
    }
    Ok(Value::List(items))
}

fn decode_dict(input: &[u8], pos: &mut usize) -> Result<Value, BencodeError> {
    debug_assert_eq!(input[*pos], b'd');
    *pos += 1;
    let mut map = BTreeMap::new();
    loop {
        match input.get(*pos) {
            Some(b'e') => {
                *pos += 1;
                break;
            }
            Some(b'0'..=b'9') => {
                let key = decode_bytes(input, pos)?;
                let value = decode_value(input, pos)?;
                map.insert(key, value);
            }
            Some(_) => return Err(BencodeError::NonStringKey),
            None => return Err(BencodeError::UnexpectedEnd),
        }
    }
    Ok(Value::Dict(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalar_values() {
        let v = Value::Int(-42);
        assert_eq!(decode(&encode(&v)).unwrap(), v);
        let v = Value::Bytes(b"hello".to_vec());
        assert_eq!(decode(&encode(&v)).unwrap(), v);
    }

    #[test]
    fn dict_encodes_keys_in_lexicographic_order_regardless_of_insertion() {
        let mut map = BTreeMap::new();
        map.insert(b"z".to_vec(), Value::Int(1));
        map.insert(b"a".to_vec(), Value::Int(2));
        map.insert(b"m".to_vec(), Value::Int(3));
        let encoded = encode(&Value::Dict(map));
        assert_eq!(encoded, b"d1:ai2e1:mi3e1:zi1ee");
    }

    #[test]
    fn rejects_trailing_bytes() {
        let err = decode(b"i1ee").unwrap_err();
        assert!(matches!(err, BencodeError::TrailingBytes));
    }

    #[test]
    fn rejects_truncated_input() {
        let err = decode(b"5:ab").unwrap_err();
        assert!(matches!(err, BencodeError::UnexpectedEnd));
    }
}

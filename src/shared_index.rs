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

//! The shared-archive index binary codec (§4.5): the big-endian, length-prefixed
//! record stream an archive server publishes describing its channels and
//! messages, plus the derived per-entry URL list.

use std::io::{Cursor, Read};

use thiserror::Error;

use crate::crypto::i2p_base64_encode;

/// Per-component guard: no count in the wire format may exceed this (§4.5, §8).
pub const MAX_ENTRIES: u32 = 10_000;

const INVALID_ARCHIVE_SERVER: &str = "invalid syndie archive server";

/// Errors decoding or validating a shared-archive index.
#[derive(Debug, Error)]
pub enum ArchiveIndexError {
    /// The byte stream ended before a fixed-size field could be read.
    #[error("io error reading shared index: {0}")]
    Io(#[from] std::io::Error),
    /// `num_alt_uris` exceeded [`MAX_ENTRIES`].
    #[error("{INVALID_ARCHIVE_SERVER}: too many alternate archive URIs")]
    TooManyAltUris,
    /// `num_channels` exceeded [`MAX_ENTRIES`].
    #[error("{INVALID_ARCHIVE_SERVER}: too many channels")]
    TooManyChannels,
    /// `num_messages` exceeded [`MAX_ENTRIES`].
    #[error("{INVALID_ARCHIVE_SERVER}: too many messages")]
    TooManyMessages,
    /// An alt-URI's declared byte length was not valid UTF-8.
    #[error("alternate archive URI is not valid UTF-8")]
    AltUriNotUtf8,
    /// A message's `scope_channel` index was out of range.
    #[error("scope_channel {0} out of range for {1} channels")]
    ScopeChannelOutOfRange(u32, u32),
    /// A message's `target_channel` index was out of range.
    #[error("target_channel {0} out of range for {1} channels")]
    TargetChannelOutOfRange(u32, u32),
}

/// One channel entry: its 32-byte hash, edition, and flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelEntry {
    /// Channel hash.
    pub hash: [u8; 32],
    /// Monotonic edition counter.
    pub edition: u64,
    /// Flags bitfield.
    pub flags: u8,
}

/// One message entry: its id, scope/target channel indices, and flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageEntry {
    /// Message id.
    pub id: u64,
    /// Index into the index's channel list: the channel the message was fetched from.
    pub scope_channel: u32,
    /// Index into the index's channel list: the channel the message targets.
    pub target_channel: u32,
    /// Flags bitfield.
    pub flags: u8,
}

/// A decoded shared-archive index (§3, §4.5).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ArchiveIndex {
    /// Archive-level flags.
    pub archive_flags: u16,
    /// The admin channel identifier.
    pub admin_channel: u32,
    /// Alternate archive URIs, in wire order.
    pub alt_uris: Vec<String>,
    /// Channels, in wire order (message entries index into this list).
    pub channels: Vec<ChannelEntry>,
    /// Messages, in wire order.
    pub messages: Vec<MessageEntry>,
}

fn read_u8(r: &mut impl Read) -> Result<u8, ArchiveIndexError> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_u16(r: &mut impl Read) -> Result<u16, ArchiveIndexError> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_be_bytes(b))
}

fn read_u32(r: &mut impl Read) -> Result<u32, ArchiveIndexError> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_be_bytes(b))
}

fn read_u64(r: &mut impl Read) -> Result<u64, ArchiveIndexError> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_be_bytes(b))
}

/// Decodes a shared-archive index from its big-endian wire form (§4.5).
///
/// Validates every count guard and the `scope_channel`/`target_channel` range
/// invariant before returning.
pub fn decode_archive_index(bytes: &[u8]) -> Result<ArchiveIndex, ArchiveIndexError> {
    let mut r = Cursor::new(bytes);

    let archive_flags = read_u16(&mut r)?;
    let admin_channel = read_u32(&mut r)?;

    let num_alt_uris = read_u8(&mut r)?;
    if num_alt_uris as u32 > MAX_ENTRIES {
        return Err(ArchiveIndexError::TooManyAltUris);
    }
    let mut alt_uris = Vec::with_capacity(num_alt_uris as usize);
    for _ in 0..num_alt_uris {
        let len = read_u16(&mut r)? as usize;
        let mut raw = vec![0u8; len];
        r.read_exact(&mut raw)?;
        alt_uris.push(String::from_utf8(raw).map_err(|_| ArchiveIndexError::AltUriNotUtf8)?);
    }

    let num_channels = read_u32(&mut r)?;
    if num_channels > MAX_ENTRIES {
        return Err(ArchiveIndexError::TooManyChannels);
    }
    let mut channels = Vec::with_capacity(num_channels as usize);
    for _ in 0..num_channels {
        let mut hash = [0u8; 32];
        r.read_exact(&mut hash)?;
        let edition = read_u64(&mut r)?;
        let flags = read_u8(&mut r)?;
        channels.push(ChannelEntry { hash, edition, flags });
    }

    let num_messages = read_u32(&mut r)?;
    if num_messages > MAX_ENTRIES {
        return Err(ArchiveIndexError::TooManyMessages);
    }
    let mut messages = Vec::with_capacity(num_messages as usize);
    for _ in 0..num_messages {
        let id = read_u64(&mut r)?;
        let scope_channel = read_u32(&mut r)?;
        let target_channel = read_u32(&mut r)?;
        let flags = read_u8(&mut r)?;
        if scope_channel >= num_channels {
            return Err(ArchiveIndexError::ScopeChannelOutOfRange(scope_channel, num_channels));
        }
        if target_channel >= num_channels {
            return Err(ArchiveIndexError::TargetChannelOutOfRange(target_channel, num_channels));
        }
        messages.push(MessageEntry {
            id,
            scope_channel,
            target_channel,
            flags,
        });
    }

    Ok(ArchiveIndex {
        archive_flags,
        admin_channel,
        alt_uris,
        channels,
        messages,
    })
}

/// Encodes a shared-archive index back to its big-endian wire form.
pub fn encode_archive_index(index: &ArchiveIndex) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&index.archive_flags.to_be_bytes());
    out.extend_from_slice(&index.admin_channel.to_be_bytes());

    out.push(index.alt_uris.len() as u8);
    for uri in &index.alt_uris {
        out.extend_from_slice(&(uri.len() as u16).to_be_bytes());
        out.extend_from_slice(uri.as_bytes());
    }

    out.extend_from_slice(&(index.channels.len() as u32).to_be_bytes());
    for channel in &index.channels {
        out.extend_from_slice(&channel.hash);
        out.extend_from_slice(&channel.edition.to_be_bytes());
        out.push(channel.flags);
    }

    out.extend_from_slice(&(index.messages.len() as u32).to_be_bytes());
    for message in &index.messages {
        out.extend_from_slice(&message.id.to_be_bytes());
        out.extend_from_slice(&message.scope_channel.to_be_bytes());
        out.extend_from_slice(&message.target_channel.to_be_bytes());
        out.push(message.flags);
    }

    out
}

/// Derives the per-channel `meta.syndie` and per-message `<id>.syndie` URL paths,
/// in read order (channels first, then messages), matching
/// `archive/client/client.go`'s derivation loop.
pub fn derive_urls(index: &ArchiveIndex) -> Vec<String> {
    let mut urls = Vec::with_capacity(index.channels.len() + index.messages.len());
    for channel in &index.channels {
        urls.push(format!("{}/meta.syndie", i2p_base64_encode(&channel.hash)));
    }
    for message in &index.messages {
        let scope_hash = &index.channels[message.scope_channel as usize].hash;
        urls.push(format!("{}/{}.syndie", i2p_base64_encode(scope_hash), message.id));
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArchiveIndex {
        ArchiveIndex {
            archive_flags: 0,
            admin_channel: 0,
            alt_uris: vec![],
            channels: vec![ChannelEntry {
                hash: [0xab; 32],
                edition: 7,
                flags: 0,
            }],
            messages: vec![MessageEntry {
                id: 5,
                scope_channel: 0,
                target_channel: 0,
                flags: 0,
            }],
        }
    }

    #[test]
    fn decodes_seed_scenario_from_spec() {
        let idx = sample();
        let bytes = encode_archive_index(&idx);
        let decoded = decode_archive_index(&bytes).unwrap();
        assert_eq!(decoded, idx);
        let urls = derive_urls(&decoded);
        assert_eq!(urls.len(), 2);
        assert!(urls[0].ends_with("/meta.syndie"));
        assert!(urls[1].ends_with("/5.syndie"));
    }

    #[test]
    fn round_trips_encode_decode() {
        let idx = sample();
        let again = decode_archive_index(&encode_archive_index(&idx)).unwrap();
        assert_eq!(idx, again);
    }

    #[test]
    fn rejects_channel_count_over_limit() {
        let mut bytes = vec![0u8; 2 + 4 + 1];
        bytes.extend_from_slice(&(MAX_ENTRIES + 1).to_be_bytes());
        let err = decode_archive_index(&bytes).unwrap_err();
        assert!(matches!(err, ArchiveIndexError::TooManyChannels));
    }

    #[test]
    fn rejects_out_of_range_scope_channel() {
        let mut idx = sample();
        idx.messages[0].scope_channel = 1;
        let bytes = encode_archive_index(&idx);
        let err = decode_archive_index(&bytes).unwrap_err();
        assert!(matches!(err, ArchiveIndexError::ScopeChannelOutOfRange(1, 1)));
    }
}

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
#![warn(missing_docs)]

//! Syndie enclosure codec.
//!
//! This crate parses, authenticates, decrypts, and decodes a Syndie message
//! file — a self-describing, signed, encrypted container used by the Syndie
//! distributed forum system — plus the companion shared-archive index format
//! Syndie archive servers use to advertise the channels and messages they
//! hold.
//!
//! The decode pipeline ([`pipeline::decode`]) never releases a [`message::Message`]
//! unless the trailing HMAC verifies (when enabled), regardless of which stage
//! produced a partial result internally.

/// Bencode values: the wire encoding underneath the URI codec.
pub mod bencode;
/// The Syndie URI codec: a bencoded attribute dictionary with a `urn:syndie:` form.
pub mod uri;
/// The `key=value` header grammar shared by the outer header and `headers.dat`.
pub mod header;
/// The decoded message payload: pages, attachments, avatar, references.
pub mod message;
/// Decodes the ZIP archive embedded in an enclosure's plaintext payload.
pub mod archive_inner;
/// AES-256-CBC decryption and HMAC-SHA256 key derivation/verification.
pub mod crypto;
/// The 11-stage enclosure decode pipeline and its configuration type.
pub mod pipeline;
/// The shared-archive index binary codec.
pub mod shared_index;
/// Channel-metadata encoding.
pub mod metadata;
/// The top-level decode error taxonomy.
pub mod error;
/// File-backed configuration mirroring [`pipeline::DecodeOptions`].
pub mod config;

pub use crate::config::{ConfigError, DecodeConfig};
pub use crate::error::{DecodeError, Stage};
pub use crate::message::{Attachment, Message, Page};
pub use crate::pipeline::{decode, DecodeOptions};
pub use crate::shared_index::{
    decode_archive_index, derive_urls, encode_archive_index, ArchiveIndex, ArchiveIndexError,
    ChannelEntry, MessageEntry,
};
pub use crate::metadata::{encode_metadata, ChannelMetadata};
pub use crate::uri::{decode_uri as parse_uri, encode_uri, RefType, Uri, UriError};

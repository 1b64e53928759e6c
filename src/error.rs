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

//! Top-level decode error taxonomy.
//!
//! Per-error context follows spec §7: every variant names (a) the pipeline
//! [`Stage`] it occurred in, and (b) the byte offset into the input stream
//! where known (`None` when the failure isn't tied to one specific offset,
//! e.g. a cancellation between stages).

use std::fmt;

use crate::archive_inner::ArchiveError;
use crate::crypto::CryptoError;
use crate::header::HeaderError;
use thiserror::Error;

/// The pipeline stage an error occurred in, per the enclosure state machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// `Syndie.Message.<major>.<minor>` magic/version line.
    MagicVersion,
    /// Outer `key=value` header block.
    Header,
    /// `Size=<N>` line.
    SizeLine,
    /// Leading 16-byte IV.
    Iv,
    /// AES-256-CBC decryption.
    Decrypt,
    /// Scan for the zero padding terminator.
    PaddingScan,
    /// Internal payload size field.
    InternalSize,
    /// Internal total size field.
    TotalSize,
    /// Inner ZIP archive.
    InnerArchive,
    /// Trailing signature lines.
    SignatureBlock,
    /// HMAC-SHA256 verification.
    Hmac,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::MagicVersion => "magic_version",
            Stage::Header => "header",
            Stage::SizeLine => "size_line",
            Stage::Iv => "iv",
            Stage::Decrypt => "decrypt",
            Stage::PaddingScan => "padding_scan",
            Stage::InternalSize => "internal_size",
            Stage::TotalSize => "total_size",
            Stage::InnerArchive => "inner_archive",
            Stage::SignatureBlock => "signature_block",
            Stage::Hmac => "hmac",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while decoding an enclosure.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// I/O failure reading the source.
    #[error("io error at stage {stage} (offset {offset:?}): {source}")]
    Io {
        /// Stage the failure occurred in.
        stage: Stage,
        /// Byte offset into the input where the read was attempted.
        offset: Option<u64>,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The input ended before a complete line/block could be read.
    #[error("unexpected end of input at stage {stage} (offset {offset:?})")]
    UnexpectedEof {
        /// Stage the failure occurred in.
        stage: Stage,
        /// Byte offset into the input where the stream ended.
        offset: Option<u64>,
    },
    /// The magic/version line is missing or unrecognized.
    #[error("malformed magic/version line at stage {stage} (offset {offset:?})")]
    MalformedMagicVersion {
        /// Always [`Stage::MagicVersion`].
        stage: Stage,
        /// Byte offset of the offending line.
        offset: Option<u64>,
    },
    /// Header parsing failed.
    #[error("header error at stage {stage} (offset {offset:?}): {source}")]
    Header {
        /// Stage the failure occurred in ([`Stage::Header`] or [`Stage::InnerArchive`]
        /// for a merged `headers.dat` block).
        stage: Stage,
        /// Byte offset of the offending line, where known.
        offset: Option<u64>,
        /// Underlying header-grammar error.
        #[source]
        source: HeaderError,
    },
    /// `Size=` line missing, non-numeric, or out of bounds.
    #[error("malformed size line at stage {stage} (offset {offset:?})")]
    MalformedSizeLine {
        /// Always [`Stage::SizeLine`].
        stage: Stage,
        /// Byte offset of the offending line.
        offset: Option<u64>,
    },
    /// Declared envelope size is smaller than the minimum (IV + HMAC tag).
    #[error("envelope size {size} smaller than minimum framing overhead (stage {stage}, offset {offset:?})")]
    EnvelopeTooSmall {
        /// Always [`Stage::SizeLine`].
        stage: Stage,
        /// Byte offset of the `Size=` line.
        offset: Option<u64>,
        /// Declared size.
        size: u64,
    },
    /// Declared envelope size is not a multiple of the AES block size.
    #[error("envelope size {size} is not a multiple of the AES block size (stage {stage}, offset {offset:?})")]
    MisalignedSize {
        /// Always [`Stage::SizeLine`].
        stage: Stage,
        /// Byte offset of the `Size=` line.
        offset: Option<u64>,
        /// Declared size.
        size: u64,
    },
    /// Declared envelope size exceeds the configured `max_envelope_size` guard.
    #[error("envelope size {size} exceeds configured limit of {max} bytes (stage {stage}, offset {offset:?})")]
    EnvelopeTooLarge {
        /// Always [`Stage::SizeLine`].
        stage: Stage,
        /// Byte offset of the `Size=` line.
        offset: Option<u64>,
        /// Declared size.
        size: u64,
        /// Configured limit.
        max: u64,
    },
    /// `total_size + 16` did not equal the declared envelope size (§4.1 step 8).
    #[error("internal total size {total} + 16 != envelope size {envelope} (stage {stage}, offset {offset:?})")]
    TotalSizeMismatch {
        /// Always [`Stage::TotalSize`].
        stage: Stage,
        /// Byte offset of the internal total-size field within the input.
        offset: Option<u64>,
        /// `total_size` read from the plaintext.
        total: u64,
        /// The envelope's declared `Size`.
        envelope: u64,
    },
    /// Fewer than 16 bytes were available for the IV.
    #[error("truncated IV at stage {stage} (offset {offset:?})")]
    TruncatedIv {
        /// Always [`Stage::Iv`].
        stage: Stage,
        /// Byte offset where the IV was expected.
        offset: Option<u64>,
    },
    /// Cryptographic failure (decrypt or HMAC).
    #[error("crypto error at stage {stage} (offset {offset:?}): {source}")]
    Crypto {
        /// [`Stage::Decrypt`] or [`Stage::Hmac`].
        stage: Stage,
        /// Byte offset of the region the cryptographic operation acted on.
        offset: Option<u64>,
        /// Underlying cryptographic error.
        #[source]
        source: CryptoError,
    },
    /// No zero byte found while scanning the padding region.
    #[error("padding zero terminator not found within {limit} bytes (stage {stage}, offset {offset:?})")]
    PaddingZeroNotFound {
        /// Always [`Stage::PaddingScan`].
        stage: Stage,
        /// Byte offset where the padding scan began.
        offset: Option<u64>,
        /// The bounded scan limit that was exhausted.
        limit: usize,
    },
    /// Truncated or malformed internal size fields.
    #[error("malformed internal size fields at stage {stage} (offset {offset:?})")]
    MalformedInternalSize {
        /// Always [`Stage::InternalSize`].
        stage: Stage,
        /// Byte offset where the size fields were expected.
        offset: Option<u64>,
    },
    /// `internal_size` exceeds the bytes actually available in the envelope.
    #[error("internal payload size {internal} exceeds available bytes {available} (stage {stage}, offset {offset:?})")]
    InternalSizeOutOfBounds {
        /// Always [`Stage::InnerArchive`].
        stage: Stage,
        /// Byte offset where the inner archive was expected to start.
        offset: Option<u64>,
        /// Declared internal size.
        internal: u64,
        /// Bytes actually available.
        available: u64,
    },
    /// The inner ZIP archive could not be read or is structurally invalid.
    #[error("inner archive error at stage {stage} (offset {offset:?}): {source}")]
    Archive {
        /// Always [`Stage::InnerArchive`].
        stage: Stage,
        /// Byte offset where the inner archive begins.
        offset: Option<u64>,
        /// Underlying inner-archive error.
        #[source]
        source: ArchiveError,
    },
    /// Trailing signature lines are missing while signature verification is required.
    #[error("missing required signature line (stage {stage}, offset {offset:?})")]
    MissingSignature {
        /// Always [`Stage::SignatureBlock`].
        stage: Stage,
        /// Byte offset where the signature block was expected.
        offset: Option<u64>,
    },
    /// A line in the trailing signature block is neither a known signature key nor blank.
    #[error("malformed signature block line at stage {stage} (offset {offset:?})")]
    MalformedSignatureBlock {
        /// Always [`Stage::SignatureBlock`].
        stage: Stage,
        /// Byte offset of the offending line.
        offset: Option<u64>,
    },
    /// Operation was cancelled by the caller.
    #[error("decode cancelled before stage {stage}")]
    Cancelled {
        /// The stage the pipeline was about to enter when cancellation was observed.
        stage: Stage,
    },
}

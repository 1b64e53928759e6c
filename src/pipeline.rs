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

//! The enclosure decode pipeline (§4.1): an 11-stage, single-threaded state
//! machine that walks an input stream from its plaintext magic/header block
//! through the encrypted envelope into a decoded [`Message`], verifying the
//! HMAC before any result is released.

use std::io::{BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::archive_inner::decode_inner_archive;
use crate::crypto::{decode_body_key, decrypt_aes_cbc, derive_hmac_key, verify_hmac};
use crate::error::{DecodeError, Stage};
use crate::header::{Header, MAX_HEADER_LINES};
use crate::message::Message;

const MAGIC_PREFIX: &str = "Syndie.Message.1.";
const IV_LEN: usize = 16;
const HMAC_TAG_LEN: usize = 32;
const AES_BLOCK_SIZE: u64 = 16;
const MIN_ENVELOPE_SIZE: u64 = IV_LEN as u64 + AES_BLOCK_SIZE + HMAC_TAG_LEN as u64;
const PADDING_SCAN_LIMIT: usize = 1024;

/// Decode-time configuration (§6). Recognized options: `body_key`,
/// `require_hmac`, `max_envelope_size`, `max_inner_size`, `strict_unknown_keys`,
/// plus `require_signature_verification` and a cooperative cancellation flag.
///
/// A plain configuration record, per §9's note that the source's functional
/// option builders carry no behavior the record form can't express.
#[derive(Clone)]
pub struct DecodeOptions {
    /// I2P-base64 AES-256 body key.
    pub body_key: String,
    /// Require `AuthorizationSig=`/`AuthenticationSig=` lines to be present.
    pub require_signature_verification: bool,
    /// Require the HMAC to verify before releasing a [`Message`].
    pub require_hmac: bool,
    /// Upper bound on the declared envelope `Size`, guarding against
    /// adversarially large allocations.
    pub max_envelope_size: u64,
    /// Upper bound on the inner archive's total uncompressed bytes.
    pub max_inner_size: u64,
    /// Reject header/entry keys outside the recognized set.
    pub strict_unknown_keys: bool,
    /// Checked between pipeline stages; set it to cooperatively cancel a decode
    /// in progress from another thread.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            body_key: String::new(),
            require_signature_verification: true,
            require_hmac: true,
            max_envelope_size: 64 * 1024 * 1024,
            max_inner_size: 64 * 1024 * 1024,
            strict_unknown_keys: true,
            cancel: None,
        }
    }
}

fn check_cancelled(options: &DecodeOptions, stage: Stage) -> Result<(), DecodeError> {
    if let Some(flag) = &options.cancel {
        if flag.load(Ordering::Relaxed) {
            return Err(DecodeError::Cancelled { stage });
        }
    }
    Ok(())
}

/// Reads one LF-terminated line, stripping the trailing `\n` (and a preceding
/// `\r`, tolerating CRLF input). Returns `Ok(None)` at a clean EOF. Advances
/// `pos` by the number of raw bytes consumed (including the line terminator),
/// so a later error can report the offset the failing line started at.
fn read_line(reader: &mut impl BufRead, stage: Stage, pos: &mut u64) -> Result<Option<String>, DecodeError> {
    let start = *pos;
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .map_err(|e| DecodeError::Io { stage, offset: Some(start), source: e })?;
    if n == 0 {
        return Ok(None);
    }
    *pos += n as u64;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

fn read_magic_version_line(reader: &mut impl BufRead, pos: &mut u64) -> Result<String, DecodeError> {
    let start = *pos;
    let line = read_line(reader, Stage::MagicVersion, pos)?.ok_or(DecodeError::MalformedMagicVersion {
        stage: Stage::MagicVersion,
        offset: Some(start),
    })?;
    if !line.starts_with(MAGIC_PREFIX) {
        return Err(DecodeError::MalformedMagicVersion {
            stage: Stage::MagicVersion,
            offset: Some(start),
        });
    }
    Ok(line)
}

fn read_header_key_pairs(
    reader: &mut impl BufRead,
    header: &mut Header,
    strict: bool,
    pos: &mut u64,
) -> Result<(), DecodeError> {
    let mut count = 0usize;
    loop {
        if count > MAX_HEADER_LINES {
            return Err(DecodeError::Header {
                stage: Stage::Header,
                offset: Some(*pos),
                source: crate::header::HeaderError::TooManyLines(MAX_HEADER_LINES),
            });
        }
        let line_start = *pos;
        let line = read_line(reader, Stage::Header, pos)?.ok_or(DecodeError::UnexpectedEof {
            stage: Stage::Header,
            offset: Some(line_start),
        })?;
        if line.is_empty() {
            break;
        }
        header.apply_line(&line, strict).map_err(|e| DecodeError::Header {
            stage: Stage::Header,
            offset: Some(line_start),
            source: e,
        })?;
        count += 1;
    }
    Ok(())
}

fn read_size_line(reader: &mut impl BufRead, pos: &mut u64) -> Result<u64, DecodeError> {
    let start = *pos;
    let line = read_line(reader, Stage::SizeLine, pos)?.ok_or(DecodeError::MalformedSizeLine {
        stage: Stage::SizeLine,
        offset: Some(start),
    })?;
    let value = line.strip_prefix("Size=").ok_or(DecodeError::MalformedSizeLine {
        stage: Stage::SizeLine,
        offset: Some(start),
    })?;
    value.parse::<u64>().map_err(|_| DecodeError::MalformedSizeLine {
        stage: Stage::SizeLine,
        offset: Some(start),
    })
}

fn validate_size(size: u64, max_envelope_size: u64, offset: u64) -> Result<(), DecodeError> {
    if size > max_envelope_size {
        return Err(DecodeError::EnvelopeTooLarge {
            stage: Stage::SizeLine,
            offset: Some(offset),
            size,
            max: max_envelope_size,
        });
    }
    if size < MIN_ENVELOPE_SIZE {
        return Err(DecodeError::EnvelopeTooSmall {
            stage: Stage::SizeLine,
            offset: Some(offset),
            size,
        });
    }
    if size % AES_BLOCK_SIZE != 0 {
        return Err(DecodeError::MisalignedSize {
            stage: Stage::SizeLine,
            offset: Some(offset),
            size,
        });
    }
    Ok(())
}

/// Peeks the leading 16 bytes of the envelope as the IV, without consuming them
/// (§4.1 step 4; the same bytes are read again as part of the `Size`-byte
/// envelope in the decrypt stage, per the original source's `Peek` behavior —
/// see SPEC_FULL's supplemented-behavior note 1).
fn peek_iv(reader: &mut impl BufRead, pos: u64) -> Result<[u8; IV_LEN], DecodeError> {
    let buf = reader
        .fill_buf()
        .map_err(|e| DecodeError::Io { stage: Stage::Iv, offset: Some(pos), source: e })?;
    if buf.len() < IV_LEN {
        return Err(DecodeError::TruncatedIv { stage: Stage::Iv, offset: Some(pos) });
    }
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&buf[..IV_LEN]);
    Ok(iv)
}

fn read_envelope(reader: &mut impl BufRead, size: u64, pos: &mut u64) -> Result<Vec<u8>, DecodeError> {
    let start = *pos;
    let mut envelope = vec![0u8; size as usize];
    reader
        .read_exact(&mut envelope)
        .map_err(|e| DecodeError::Io { stage: Stage::Decrypt, offset: Some(start), source: e })?;
    *pos += size;
    Ok(envelope)
}

fn decrypt_envelope(body_key: &str, envelope: &[u8], envelope_offset: u64) -> Result<(Vec<u8>, [u8; 32]), DecodeError> {
    let key = decode_body_key(body_key).map_err(|e| DecodeError::Crypto {
        stage: Stage::Decrypt,
        offset: Some(envelope_offset),
        source: e,
    })?;
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&envelope[..IV_LEN]);
    let ciphertext = &envelope[IV_LEN..envelope.len() - HMAC_TAG_LEN];
    let plaintext = decrypt_aes_cbc(&key, &iv, ciphertext).map_err(|e| DecodeError::Crypto {
        stage: Stage::Decrypt,
        offset: Some(envelope_offset + IV_LEN as u64),
        source: e,
    })?;
    Ok((plaintext, *key))
}

/// Scans for the single `0x00` padding terminator (§4.1 step 6), requiring every
/// byte before it to be non-zero. `plaintext_offset` is the file offset of the
/// first plaintext byte, for error reporting.
fn scan_padding_zero(plaintext: &[u8], plaintext_offset: u64) -> Result<usize, DecodeError> {
    let limit = plaintext.len().min(PADDING_SCAN_LIMIT);
    for (i, &b) in plaintext[..limit].iter().enumerate() {
        if b == 0 {
            return Ok(i);
        }
    }
    Err(DecodeError::PaddingZeroNotFound {
        stage: Stage::PaddingScan,
        offset: Some(plaintext_offset),
        limit: PADDING_SCAN_LIMIT,
    })
}

fn read_u32_be(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

struct SizeFields {
    internal_size: u64,
    total_size: u64,
}

fn read_size_fields(plaintext: &[u8], p: usize, plaintext_offset: u64) -> Result<SizeFields, DecodeError> {
    if plaintext.len() < p + 9 {
        return Err(DecodeError::MalformedInternalSize {
            stage: Stage::InternalSize,
            offset: Some(plaintext_offset + p as u64),
        });
    }
    let internal_size = read_u32_be(&plaintext[p + 1..p + 5]) as u64;
    let total_size = read_u32_be(&plaintext[p + 5..p + 9]) as u64;
    Ok(SizeFields {
        internal_size,
        total_size,
    })
}

fn slice_inner_archive(
    plaintext: &[u8],
    p: usize,
    internal_size: u64,
    plaintext_offset: u64,
) -> Result<&[u8], DecodeError> {
    let start = p + 9;
    let inner_offset = plaintext_offset + start as u64;
    let end = start
        .checked_add(internal_size as usize)
        .ok_or(DecodeError::InternalSizeOutOfBounds {
            stage: Stage::InnerArchive,
            offset: Some(inner_offset),
            internal: internal_size,
            available: plaintext.len() as u64,
        })?;
    plaintext
        .get(start..end)
        .ok_or(DecodeError::InternalSizeOutOfBounds {
            stage: Stage::InnerArchive,
            offset: Some(inner_offset),
            internal: internal_size,
            available: plaintext.len().saturating_sub(start) as u64,
        })
}

/// Trailing signature lines: `AuthorizationSig=` and `AuthenticationSig=`,
/// tolerant of either emission order (§4.1 step 10, SPEC_FULL note 7).
struct SignatureBlock {
    authorization: Option<String>,
    authentication: Option<String>,
}

fn read_signature_block(reader: &mut impl BufRead, pos: &mut u64) -> Result<SignatureBlock, DecodeError> {
    let mut block = SignatureBlock {
        authorization: None,
        authentication: None,
    };
    loop {
        let line_start = *pos;
        let Some(line) = read_line(reader, Stage::SignatureBlock, pos)? else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        if let Some(value) = line.strip_prefix("AuthorizationSig=") {
            block.authorization = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("AuthenticationSig=") {
            block.authentication = Some(value.to_string());
        } else {
            return Err(DecodeError::MalformedSignatureBlock {
                stage: Stage::SignatureBlock,
                offset: Some(line_start),
            });
        }
    }
    Ok(block)
}

/// Runs the full 11-stage enclosure decode pipeline (§4.1) and returns the
/// decoded [`Message`], or a typed [`DecodeError`] naming the stage that failed.
///
/// No partial [`Message`] is ever returned: if `require_hmac` is set (the
/// default), HMAC verification (step 11) must succeed before this function
/// returns `Ok`.
pub fn decode<R: Read>(input: R, options: &DecodeOptions) -> Result<Message, DecodeError> {
    let mut reader = BufReader::new(input);
    let mut pos: u64 = 0;

    check_cancelled(options, Stage::MagicVersion)?;
    let version = read_magic_version_line(&mut reader, &mut pos)?;

    check_cancelled(options, Stage::Header)?;
    let mut header = Header::default();
    header.set_version_line(&version);
    read_header_key_pairs(&mut reader, &mut header, options.strict_unknown_keys, &mut pos)?;

    check_cancelled(options, Stage::SizeLine)?;
    let size_line_offset = pos;
    let size = read_size_line(&mut reader, &mut pos)?;
    validate_size(size, options.max_envelope_size, size_line_offset)?;

    check_cancelled(options, Stage::Iv)?;
    let envelope_offset = pos;
    let iv = peek_iv(&mut reader, envelope_offset)?;

    check_cancelled(options, Stage::Decrypt)?;
    let envelope = read_envelope(&mut reader, size, &mut pos)?;
    debug_assert_eq!(&envelope[..IV_LEN], &iv);
    let (plaintext, body_key_bytes) = decrypt_envelope(&options.body_key, &envelope, envelope_offset)?;
    let plaintext_offset = envelope_offset + IV_LEN as u64;

    check_cancelled(options, Stage::PaddingScan)?;
    let p = scan_padding_zero(&plaintext, plaintext_offset)?;

    check_cancelled(options, Stage::InternalSize)?;
    let fields = read_size_fields(&plaintext, p, plaintext_offset)?;
    if fields.total_size + IV_LEN as u64 != size {
        return Err(DecodeError::TotalSizeMismatch {
            stage: Stage::TotalSize,
            offset: Some(plaintext_offset + p as u64 + 5),
            total: fields.total_size,
            envelope: size,
        });
    }

    check_cancelled(options, Stage::InnerArchive)?;
    let inner_offset = plaintext_offset + p as u64 + 9;
    if fields.internal_size > options.max_inner_size {
        return Err(DecodeError::Archive {
            stage: Stage::InnerArchive,
            offset: Some(inner_offset),
            source: crate::archive_inner::ArchiveError::TooLarge(options.max_inner_size),
        });
    }
    let inner_bytes = slice_inner_archive(&plaintext, p, fields.internal_size, plaintext_offset)?;
    let message = decode_inner_archive(
        inner_bytes,
        &mut header,
        options.strict_unknown_keys,
        options.max_inner_size,
    )
    .map_err(|e| DecodeError::Archive {
        stage: Stage::InnerArchive,
        offset: Some(inner_offset),
        source: e,
    })?;

    check_cancelled(options, Stage::SignatureBlock)?;
    let signature_block_offset = envelope_offset + size;
    let signatures = read_signature_block(&mut reader, &mut pos)?;
    if options.require_signature_verification
        && (signatures.authorization.is_none() || signatures.authentication.is_none())
    {
        return Err(DecodeError::MissingSignature {
            stage: Stage::SignatureBlock,
            offset: Some(signature_block_offset),
        });
    }

    check_cancelled(options, Stage::Hmac)?;
    if options.require_hmac {
        let hmac_key = derive_hmac_key(&body_key_bytes, &iv);
        let ciphertext = &envelope[IV_LEN..envelope.len() - HMAC_TAG_LEN];
        let tag = &envelope[envelope.len() - HMAC_TAG_LEN..];
        verify_hmac(&*hmac_key, ciphertext, tag).map_err(|e| DecodeError::Crypto {
            stage: Stage::Hmac,
            offset: Some(envelope_offset + size - HMAC_TAG_LEN as u64),
            source: e,
        })?;
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_hmac_key, i2p_base64_encode};
    use aes::cipher::{BlockEncryptMut, KeyIvInit as _};
    use cbc::cipher::block_padding::NoPadding;
    use std::io::Cursor;
    use std::io::Write as _;
    use zip::write::FileOptions;

    fn build_inner_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let opts = FileOptions::default();
            for (name, data) in entries {
                writer.start_file(*name, opts).unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    fn build_enclosure(body_key: &[u8; 32], inner_zip: &[u8]) -> Vec<u8> {
        let mut plaintext = Vec::new();
        plaintext.push(0xAA); // one byte of non-zero padding
        plaintext.push(0x00); // terminator
        plaintext.extend_from_slice(&(inner_zip.len() as u32).to_be_bytes());

        let mut full_plain = plaintext;
        let total_size_offset = full_plain.len();
        full_plain.extend_from_slice(&0u32.to_be_bytes()); // placeholder, patched below
        full_plain.extend_from_slice(inner_zip);

        // pad plaintext to a multiple of 16 with extra non-zero trailing bytes (ignored per spec).
        while full_plain.len() % 16 != 0 {
            full_plain.push(0xFF);
        }

        // `total_size + 16 == envelope_size`, and `envelope_size == 16 (IV) +
        // ciphertext_len + 32 (HMAC)`, so `total_size == ciphertext_len + 32`
        // (body.go: `h.totalPayloadSize != internalTotalSize+len(h.iv)`).
        let total_size = (full_plain.len() + 32) as u32;
        full_plain[total_size_offset..total_size_offset + 4].copy_from_slice(&total_size.to_be_bytes());

        let iv = [0x11u8; 16];
        let encryptor = cbc::Encryptor::<aes::Aes256>::new(body_key.into(), &iv.into());
        let mut buf = full_plain.clone();
        let ct_len = encryptor
            .encrypt_padded_mut::<NoPadding>(&mut buf, full_plain.len())
            .unwrap()
            .len();
        buf.truncate(ct_len);

        let mut envelope = Vec::new();
        envelope.extend_from_slice(&iv);
        envelope.extend_from_slice(&buf);

        let hmac_key = derive_hmac_key(body_key, &iv);
        let tag = ring::hmac::sign(
            &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, &*hmac_key),
            &buf,
        );
        envelope.extend_from_slice(tag.as_ref());

        let size = envelope.len();

        let mut file = Vec::new();
        file.extend_from_slice(b"Syndie.Message.1.0\n");
        file.extend_from_slice(format!("BodyKey={}\n", i2p_base64_encode(body_key)).as_bytes());
        file.push(b'\n');
        file.extend_from_slice(format!("Size={size}\n").as_bytes());
        file.extend_from_slice(&envelope);
        file.extend_from_slice(b"AuthorizationSig=sig1\n");
        file.extend_from_slice(b"AuthenticationSig=sig2\n");
        file
    }

    #[test]
    fn decodes_minimal_single_page_enclosure() {
        let body_key = [42u8; 32];
        let inner = build_inner_zip(&[("page0.dat", b"hello world"), ("page0.cfg", b"")]);
        let file = build_enclosure(&body_key, &inner);

        let options = DecodeOptions {
            body_key: i2p_base64_encode(&body_key),
            ..DecodeOptions::default()
        };
        let message = decode(Cursor::new(file), &options).unwrap();
        assert_eq!(message.pages.len(), 1);
        assert_eq!(message.pages[0].data, "hello world");
    }

    #[test]
    fn tampering_with_the_ciphertext_causes_hmac_mismatch() {
        let body_key = [7u8; 32];
        let inner = build_inner_zip(&[("page0.dat", b"x"), ("page0.cfg", b"")]);
        let mut file = build_enclosure(&body_key, &inner);

        // Flip a bit inside the ciphertext region (after the `Size=` line + IV).
        let size_label = b"Size=";
        let size_label_at = file.windows(size_label.len()).position(|w| w == size_label).unwrap();
        let envelope_start = file[size_label_at..].iter().position(|&b| b == b'\n').unwrap() + size_label_at + 1;
        let tamper_at = envelope_start + 24;
        file[tamper_at] ^= 0x01;

        let options = DecodeOptions {
            body_key: i2p_base64_encode(&body_key),
            ..DecodeOptions::default()
        };
        let err = decode(Cursor::new(file), &options).unwrap_err();
        assert!(matches!(err, DecodeError::Crypto { .. }));
    }

    #[test]
    fn missing_signature_lines_error_when_required() {
        let body_key = [3u8; 32];
        let inner = build_inner_zip(&[("page0.dat", b"x"), ("page0.cfg", b"")]);
        let mut file = build_enclosure(&body_key, &inner);
        // Truncate off the trailing signature lines.
        let sig_start = file
            .windows(b"AuthorizationSig".len())
            .position(|w| w == b"AuthorizationSig")
            .unwrap();
        file.truncate(sig_start);

        let options = DecodeOptions {
            body_key: i2p_base64_encode(&body_key),
            ..DecodeOptions::default()
        };
        let err = decode(Cursor::new(file), &options).unwrap_err();
        assert!(matches!(err, DecodeError::MissingSignature { .. }));
    }

    #[test]
    fn skips_signature_requirement_when_disabled() {
        let body_key = [3u8; 32];
        let inner = build_inner_zip(&[("page0.dat", b"x"), ("page0.cfg", b"")]);
        let mut file = build_enclosure(&body_key, &inner);
        let sig_start = file
            .windows(b"AuthorizationSig".len())
            .position(|w| w == b"AuthorizationSig")
            .unwrap();
        file.truncate(sig_start);

        let options = DecodeOptions {
            body_key: i2p_base64_encode(&body_key),
            require_signature_verification: false,
            ..DecodeOptions::default()
        };
        decode(Cursor::new(file), &options).unwrap();
    }

    #[test]
    fn cancellation_flag_aborts_before_any_further_stage() {
        let body_key = [3u8; 32];
        let inner = build_inner_zip(&[("page0.dat", b"x"), ("page0.cfg", b"")]);
        let file = build_enclosure(&body_key, &inner);

        let cancel = Arc::new(AtomicBool::new(true));
        let options = DecodeOptions {
            body_key: i2p_base64_encode(&body_key),
            cancel: Some(cancel),
            ..DecodeOptions::default()
        };
        let err = decode(Cursor::new(file), &options).unwrap_err();
        assert!(matches!(err, DecodeError::Cancelled { .. }));
    }
}

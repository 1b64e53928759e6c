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

//! Decodes the ZIP archive embedded in the enclosure's plaintext payload (§4.2):
//! `headers.dat`, `references.cfg`, `avatar32.png`, and numbered page/attachment
//! pairs, reordered into ascending numeric order regardless of ZIP entry order.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use thiserror::Error;

use crate::header::{Header, HeaderError};
use crate::message::{Attachment, Message, Page};

/// Errors decoding the inner archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The plaintext slice was not a valid ZIP archive.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// Reading a ZIP entry failed.
    #[error("io error reading zip entry: {0}")]
    Io(#[from] std::io::Error),
    /// An entry's bytes were not valid UTF-8 where text was required.
    #[error("entry {0:?} is not valid UTF-8")]
    NotUtf8(String),
    /// An entry name matched none of the recognized kinds, under strict mode.
    #[error("unrecognized archive entry {0:?}")]
    UnknownEntry(String),
    /// A `pageN.cfg`/`pageN.dat` entry line was malformed or had an unknown key.
    #[error("malformed page entry line: {0:?}")]
    MalformedPage(String),
    /// An `attachmentN.cfg`/`attachmentN.dat` entry line was malformed or had an unknown key.
    #[error("malformed attachment entry line: {0:?}")]
    MalformedAttachment(String),
    /// A page had only a `.cfg` or only a `.dat` half.
    #[error("page {0} is missing its {1} half")]
    UnpairedPage(u32, &'static str),
    /// An attachment had only a `.cfg` or only a `.dat` half.
    #[error("attachment {0} is missing its {1} half")]
    UnpairedAttachment(u32, &'static str),
    /// `headers.dat` failed the outer header grammar.
    #[error("headers.dat error: {0}")]
    Header(#[from] HeaderError),
    /// The sum of entry sizes exceeded the configured `max_inner_size` guard.
    #[error("inner archive exceeds configured size limit of {0} bytes")]
    TooLarge(u64),
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Suffix {
    Cfg,
    Dat,
}

enum EntryKind {
    Headers,
    References,
    Avatar,
    Page(u32, Suffix),
    Attachment(u32, Suffix),
    Unknown,
}

fn parse_numbered(rest: &str) -> Option<(u32, Suffix)> {
    if let Some(n) = rest.strip_suffix(".cfg") {
        n.parse().ok().map(|i| (i, Suffix::Cfg))
    } else if let Some(n) = rest.strip_suffix(".dat") {
        n.parse().ok().map(|i| (i, Suffix::Dat))
    } else {
        None
    }
}

fn classify(name: &str) -> EntryKind {
    match name {
        "headers.dat" => return EntryKind::Headers,
        "references.cfg" => return EntryKind::References,
        "avatar32.png" => return EntryKind::Avatar,
        _ => {}
    }
    if let Some(rest) = name.strip_prefix("page") {
        if let Some((idx, suffix)) = parse_numbered(rest) {
            return EntryKind::Page(idx, suffix);
        }
    }
    if let Some(rest) = name.strip_prefix("attachment") {
        if let Some((idx, suffix)) = parse_numbered(rest) {
            return EntryKind::Attachment(idx, suffix);
        }
    }
    EntryKind::Unknown
}

#[derive(Default)]
struct Halves {
    cfg: Option<Vec<u8>>,
    dat: Option<Vec<u8>>,
}

/// Decodes the embedded ZIP archive, merging `headers.dat` into `header` and
/// returning the assembled [`Message`].
///
/// `strict_unknown_entries` rejects entry names that match none of the
/// recognized kinds; `max_inner_size` bounds the total uncompressed bytes read,
/// guarding against decompression-bomb inputs.
pub fn decode_inner_archive(
    bytes: &[u8],
    header: &mut Header,
    strict_unknown_entries: bool,
    max_inner_size: u64,
) -> Result<Message, ArchiveError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;

    let mut message = Message::default();
    let mut pages: BTreeMap<u32, Halves> = BTreeMap::new();
    let mut attachments: BTreeMap<u32, Halves> = BTreeMap::new();
    let mut budget = max_inner_size;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        let size = entry.size();
        budget = budget
            .checked_sub(size)
            .ok_or(ArchiveError::TooLarge(max_inner_size))?;

        let mut raw = Vec::with_capacity(size as usize);
        entry.read_to_end(&mut raw)?;

        match classify(&name) {
            EntryKind::Headers => {
                let text = String::from_utf8(raw).map_err(|_| ArchiveError::NotUtf8(name.clone()))?;
                for line in text.lines() {
                    if !line.is_empty() {
                        header.apply_line(line, strict_unknown_entries)?;
                    }
                }
            }
            EntryKind::References => {
                let text = String::from_utf8(raw).map_err(|_| ArchiveError::NotUtf8(name.clone()))?;
                message.references = Some(text);
            }
            EntryKind::Avatar => {
                message.avatar = Some(raw);
            }
            EntryKind::Page(idx, Suffix::Cfg) => pages.entry(idx).or_default().cfg = Some(raw),
            EntryKind::Page(idx, Suffix::Dat) => pages.entry(idx).or_default().dat = Some(raw),
            EntryKind::Attachment(idx, Suffix::Cfg) => {
                attachments.entry(idx).or_default().cfg = Some(raw)
            }
            EntryKind::Attachment(idx, Suffix::Dat) => {
                attachments.entry(idx).or_default().dat = Some(raw)
            }
            EntryKind::Unknown => {
                if strict_unknown_entries {
                    return Err(ArchiveError::UnknownEntry(name));
                }
            }
        }
    }

    for (idx, halves) in pages {
        let dat = halves
            .dat
            .ok_or(ArchiveError::UnpairedPage(idx, ".dat"))?;
        let cfg = halves
            .cfg
            .ok_or(ArchiveError::UnpairedPage(idx, ".cfg"))?;
        let mut page = Page {
            data: String::from_utf8(dat).map_err(|_| ArchiveError::NotUtf8(format!("page{idx}.dat")))?,
            ..Page::default()
        };
        let cfg_text = String::from_utf8(cfg).map_err(|_| ArchiveError::NotUtf8(format!("page{idx}.cfg")))?;
        for line in cfg_text.lines() {
            if !line.is_empty() {
                page.apply_cfg_line(line)?;
            }
        }
        message.pages.push(page);
    }

    for (idx, halves) in attachments {
        let dat = halves
            .dat
            .ok_or(ArchiveError::UnpairedAttachment(idx, ".dat"))?;
        let cfg = halves
            .cfg
            .ok_or(ArchiveError::UnpairedAttachment(idx, ".cfg"))?;
        let mut attachment = Attachment {
            data: dat,
            ..Attachment::default()
        };
        let cfg_text =
            String::from_utf8(cfg).map_err(|_| ArchiveError::NotUtf8(format!("attachment{idx}.cfg")))?;
        for line in cfg_text.lines() {
            if !line.is_empty() {
                attachment.apply_cfg_line(line)?;
            }
        }
        message.attachments.push(attachment);
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
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

    #[test]
    fn decodes_single_page_in_order() {
        let zip_bytes = build_zip(&[
            ("page0.cfg", b"Content-Type=text/plain\n"),
            ("page0.dat", b"hello world"),
        ]);
        let mut header = Header::default();
        let msg = decode_inner_archive(&zip_bytes, &mut header, true, 1 << 20).unwrap();
        assert_eq!(msg.pages.len(), 1);
        assert_eq!(msg.pages[0].data, "hello world");
        assert_eq!(msg.pages[0].content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn reorders_pages_by_numeric_suffix_regardless_of_zip_order() {
        let zip_bytes = build_zip(&[
            ("page1.cfg", b""),
            ("page1.dat", b"second"),
            ("page0.cfg", b""),
            ("page0.dat", b"first"),
        ]);
        let mut header = Header::default();
        let msg = decode_inner_archive(&zip_bytes, &mut header, true, 1 << 20).unwrap();
        assert_eq!(msg.pages[0].data, "first");
        assert_eq!(msg.pages[1].data, "second");
    }

    #[test]
    fn unpaired_page_is_an_error() {
        let zip_bytes = build_zip(&[("page0.cfg", b"")]);
        let mut header = Header::default();
        let err = decode_inner_archive(&zip_bytes, &mut header, true, 1 << 20).unwrap_err();
        assert!(matches!(err, ArchiveError::UnpairedPage(0, ".dat")));
    }

    #[test]
    fn merges_headers_dat_into_outer_header() {
        let zip_bytes = build_zip(&[("headers.dat", b"Subject=from inner\n")]);
        let mut header = Header::default();
        header.subject = Some("outer".to_string());
        let _ = decode_inner_archive(&zip_bytes, &mut header, true, 1 << 20).unwrap();
        assert_eq!(header.subject.as_deref(), Some("from inner"));
    }

    #[test]
    fn unknown_entry_errors_under_strict_mode() {
        let zip_bytes = build_zip(&[("mystery.bin", b"x")]);
        let mut header = Header::default();
        let err = decode_inner_archive(&zip_bytes, &mut header, true, 1 << 20).unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownEntry(_)));
    }
}

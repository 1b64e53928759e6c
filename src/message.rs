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

//! The decoded message payload: pages, attachments, avatar, references (§3).

use crate::archive_inner::ArchiveError;
use crate::header::split_kv;

/// One page of message content.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Page {
    /// MIME content type, from `Content-Type` (matched case-insensitively).
    pub content_type: Option<String>,
    /// Page title.
    pub title: Option<String>,
    /// Opaque references string, verbatim.
    pub references: Option<String>,
    /// UTF-8 page body.
    pub data: String,
}

impl Page {
    /// Applies one `key=value` line from a `pageN.cfg` entry.
    pub fn apply_cfg_line(&mut self, line: &str) -> Result<(), ArchiveError> {
        let (key, value) = split_kv(line).map_err(|_| ArchiveError::MalformedPage(line.to_string()))?;
        if key.eq_ignore_ascii_case("content-type") {
            self.content_type = Some(value.to_string());
        } else if key == "Title" {
            self.title = Some(value.to_string());
        } else if key == "References" {
            self.references = Some(value.to_string());
        } else {
            return Err(ArchiveError::MalformedPage(line.to_string()));
        }
        Ok(())
    }
}

/// One attachment: name, content type, description, and raw bytes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Attachment {
    /// File name.
    pub name: Option<String>,
    /// MIME content type, from `Content-Type` (matched case-insensitively).
    pub content_type: Option<String>,
    /// Freeform description.
    pub description: Option<String>,
    /// Raw attachment bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Applies one `key=value` line from an `attachmentN.cfg` entry.
    pub fn apply_cfg_line(&mut self, line: &str) -> Result<(), ArchiveError> {
        let (key, value) =
            split_kv(line).map_err(|_| ArchiveError::MalformedAttachment(line.to_string()))?;
        if key == "Name" {
            self.name = Some(value.to_string());
        } else if key.eq_ignore_ascii_case("content-type") {
            self.content_type = Some(value.to_string());
        } else if key == "Description" {
            self.description = Some(value.to_string());
        } else {
            return Err(ArchiveError::MalformedAttachment(line.to_string()));
        }
        Ok(())
    }
}

/// A fully decoded Syndie message: the embedded archive's contents.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    /// Pages, in ascending numeric order of their entry suffix.
    pub pages: Vec<Page>,
    /// Attachments, in ascending numeric order of their entry suffix.
    pub attachments: Vec<Attachment>,
    /// Optional raw PNG avatar bytes.
    pub avatar: Option<Vec<u8>>,
    /// Opaque references document, verbatim.
    pub references: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_cfg_accepts_case_insensitive_content_type() {
        let mut p = Page::default();
        p.apply_cfg_line("content-type=text/plain").unwrap();
        p.apply_cfg_line("Title=hi").unwrap();
        assert_eq!(p.content_type.as_deref(), Some("text/plain"));
        assert_eq!(p.title.as_deref(), Some("hi"));
    }

    #[test]
    fn page_cfg_rejects_unknown_key() {
        let mut p = Page::default();
        let err = p.apply_cfg_line("Bogus=1").unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedPage(_)));
    }

    #[test]
    fn attachment_cfg_rejects_unknown_key() {
        let mut a = Attachment::default();
        let err = a.apply_cfg_line("Bogus=1").unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedAttachment(_)));
    }
}

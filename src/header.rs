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

//! The `key=value` header grammar (§4.3) shared by the outer enclosure header
//! and `headers.dat`. Page and attachment `.cfg` blocks use the smaller key
//! tables in [`crate::message`] but share [`split_kv`].

use thiserror::Error;

use crate::uri::{decode_uri, Uri, UriError};

/// Maximum number of `key=value` lines accepted in one header block (§4.1 step 2).
pub const MAX_HEADER_LINES: usize = 1024;

/// Errors parsing a `key=value` header block.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// A line had no `=` separator.
    #[error("malformed header line: {0:?}")]
    MalformedLine(String),
    /// A key outside the recognized set was seen under strict mode.
    #[error("unknown header key {0:?}")]
    UnknownKey(String),
    /// More than [`MAX_HEADER_LINES`] lines were present in one block.
    #[error("header block exceeds {0} lines")]
    TooManyLines(usize),
    /// `Edition` was not a valid decimal integer.
    #[error("invalid Edition value {0:?}")]
    InvalidEdition(String),
    /// A URI-valued field failed to parse.
    #[error("uri error: {0}")]
    Uri(#[from] UriError),
}

/// Splits one header line as `key=value`, on the first `=` only.
pub fn split_kv(line: &str) -> Result<(&str, &str), HeaderError> {
    line.split_once('=')
        .ok_or_else(|| HeaderError::MalformedLine(line.to_string()))
}

fn parse_bool(value: &str) -> bool {
    value == "true"
}

fn parse_uri_list(value: &str) -> Result<Vec<Uri>, HeaderError> {
    value
        .split_ascii_whitespace()
        .map(|s| decode_uri(s).map_err(HeaderError::from))
        .collect()
}

fn parse_string_list(value: &str) -> Vec<String> {
    value.split_ascii_whitespace().map(str::to_string).collect()
}

/// A decoded Syndie header: the outer enclosure header, merged with any
/// `headers.dat` found in the inner archive (later assignments overwrite).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    /// The `Syndie.Message.1.N` magic line, captured verbatim.
    pub version: Option<String>,
    /// Author identity string.
    pub author: Option<String>,
    /// Authentication mask.
    pub authentication_mask: Option<String>,
    /// Target channel hash.
    pub target_channel: Option<String>,
    /// Identity (signing key material), verbatim.
    pub identity: Option<String>,
    /// Encrypt key, verbatim.
    pub encrypt_key: Option<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Channel/message name.
    pub name: Option<String>,
    /// Description text.
    pub description: Option<String>,
    /// Expiration, verbatim.
    pub expiration: Option<String>,
    /// Body key, I2P base64, verbatim.
    pub body_key: Option<String>,
    /// Passphrase-based-encryption salt, verbatim. Surfaced but not derived from (§9).
    pub body_key_prompt_salt: Option<String>,
    /// Passphrase prompt text, verbatim. Surfaced but not derived from (§9).
    pub body_key_prompt: Option<String>,
    /// The post target, if this is a reply.
    pub post_uri: Option<Uri>,
    /// A URI this message supersedes.
    pub overwrite_uri: Option<Uri>,
    /// Referenced URIs.
    pub references: Vec<Uri>,
    /// URIs this message cancels.
    pub cancel: Vec<Uri>,
    /// Archive URIs.
    pub archives: Vec<Uri>,
    /// Freeform tags.
    pub tags: Vec<String>,
    /// Authorized poster keys.
    pub authorized_keys: Vec<String>,
    /// Manager keys.
    pub manager_keys: Vec<String>,
    /// Channel read keys.
    pub channel_read_keys: Vec<String>,
    /// Whether a new thread is forced.
    pub force_new_thread: bool,
    /// Whether replies are refused.
    pub refuse_replies: bool,
    /// Whether posting is public.
    pub public_posting: bool,
    /// Whether replies are public.
    pub public_replies: bool,
    /// Channel metadata edition counter.
    pub edition: Option<i64>,
    /// `Syndie.MessageType`; `Some("meta")` distinguishes channel metadata from posts.
    pub message_type: Option<String>,
}

impl Header {
    /// Records the `Syndie.Message.1.N` magic line verbatim as the header's version.
    pub fn set_version_line(&mut self, line: &str) {
        self.version = Some(line.to_string());
    }

    /// Applies one `key=value` header line, overwriting any prior value for that key.
    ///
    /// Unknown keys are rejected when `strict` is set (the default), recovering the
    /// oldest source variant's permissive behavior otherwise (§9).
    pub fn apply_line(&mut self, line: &str, strict: bool) -> Result<(), HeaderError> {
        let (key, value) = split_kv(line)?;
        match key {
            "Author" => self.author = Some(value.to_string()),
            "AuthenticationMask" => self.authentication_mask = Some(value.to_string()),
            "TargetChannel" => self.target_channel = Some(value.to_string()),
            "Identity" => self.identity = Some(value.to_string()),
            "EncryptKey" => self.encrypt_key = Some(value.to_string()),
            "Subject" => self.subject = Some(value.to_string()),
            "Name" => self.name = Some(value.to_string()),
            "Description" => self.description = Some(value.to_string()),
            "Expiration" => self.expiration = Some(value.to_string()),
            "BodyKey" => self.body_key = Some(value.to_string()),
            "BodyKeyPromptSalt" => self.body_key_prompt_salt = Some(value.to_string()),
            "BodyKeyPrompt" => self.body_key_prompt = Some(value.to_string()),
            "PostURI" => self.post_uri = Some(decode_uri(value)?),
            "OverwriteURI" => self.overwrite_uri = Some(decode_uri(value)?),
            "References" => self.references = parse_uri_list(value)?,
            "Cancel" => self.cancel = parse_uri_list(value)?,
            "Archives" => self.archives = parse_uri_list(value)?,
            "Tags" => self.tags = parse_string_list(value),
            "AuthorizedKeys" => self.authorized_keys = parse_string_list(value),
            "ManagerKeys" => self.manager_keys = parse_string_list(value),
            "ChannelReadKeys" => self.channel_read_keys = parse_string_list(value),
            "ForceNewThread" => self.force_new_thread = parse_bool(value),
            "RefuseReplies" => self.refuse_replies = parse_bool(value),
            "PublicPosting" => self.public_posting = parse_bool(value),
            "PublicReplies" => self.public_replies = parse_bool(value),
            "Edition" => {
                self.edition = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| HeaderError::InvalidEdition(value.to_string()))?,
                )
            }
            "Syndie.MessageType" => self.message_type = Some(value.to_string()),
            other => {
                if strict {
                    return Err(HeaderError::UnknownKey(other.to_string()));
                }
            }
        }
        Ok(())
    }
}

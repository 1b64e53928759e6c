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

//! `encode_metadata`: the one encode-side operation in scope (§6) — producing the
//! plaintext header form of a channel-metadata message.

/// The fields of a channel-metadata message, each emitted only if present,
/// matching `syndieutil/metadata.go`'s `String()`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChannelMetadata {
    /// Channel display name.
    pub name: Option<String>,
    /// I2P-base64 body key.
    pub body_key: Option<String>,
    /// Edition counter.
    pub edition: Option<i64>,
    /// Reply encryption key, verbatim.
    pub encrypt_key: Option<String>,
    /// Signing identity, verbatim.
    pub identity: Option<String>,
}

/// Encodes channel metadata as the plaintext header block
/// `Syndie.Message.1.0\n<key=value lines>\nSyndie.MessageType=meta\n`.
///
/// Only present fields are emitted, in `Name`, `BodyKey`, `Edition`, `EncryptKey`,
/// `Identity` order, matching the original source's field order.
pub fn encode_metadata(metadata: &ChannelMetadata) -> Vec<u8> {
    let mut out = String::from("Syndie.Message.1.0\n");

    if let Some(name) = &metadata.name {
        out.push_str("Name=");
        out.push_str(name);
        out.push('\n');
    }
    if let Some(body_key) = &metadata.body_key {
        out.push_str("BodyKey=");
        out.push_str(body_key);
        out.push('\n');
    }
    if let Some(edition) = metadata.edition {
        out.push_str("Edition=");
        out.push_str(&edition.to_string());
        out.push('\n');
    }
    if let Some(encrypt_key) = &metadata.encrypt_key {
        out.push_str("EncryptKey=");
        out.push_str(encrypt_key);
        out.push('\n');
    }
    if let Some(identity) = &metadata.identity {
        out.push_str("Identity=");
        out.push_str(identity);
        out.push('\n');
    }

    out.push_str("Syndie.MessageType=meta\n");
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_only_present_fields_in_order() {
        let meta = ChannelMetadata {
            name: Some("my-channel".to_string()),
            edition: Some(3),
            ..ChannelMetadata::default()
        };
        let encoded = String::from_utf8(encode_metadata(&meta)).unwrap();
        assert_eq!(
            encoded,
            "Syndie.Message.1.0\nName=my-channel\nEdition=3\nSyndie.MessageType=meta\n"
        );
    }

    #[test]
    fn empty_metadata_still_carries_the_magic_and_message_type_lines() {
        let encoded = String::from_utf8(encode_metadata(&ChannelMetadata::default())).unwrap();
        assert_eq!(encoded, "Syndie.Message.1.0\nSyndie.MessageType=meta\n");
    }
}

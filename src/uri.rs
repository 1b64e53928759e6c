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

//! The `urn:syndie:<refType>:<bencoded-attrs>` URI codec.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::bencode::{self, Value};

/// Errors encoding or decoding a Syndie URI.
#[derive(Debug, Error)]
pub enum UriError {
    /// Input was shorter than the minimum `a:b` shape.
    #[error("uri too short")]
    TooShort,
    /// Missing the `:` separator between ref type and attributes.
    #[error("missing refType separator")]
    MissingRefType,
    /// The ref type is not one of the five recognized values.
    #[error("invalid refType {0:?}")]
    InvalidRefType(String),
    /// The attribute section failed to bencode-decode.
    #[error("bencode error: {0}")]
    Bencode(#[from] bencode::BencodeError),
    /// The bencode value was not a dictionary.
    #[error("attributes are not a dictionary")]
    NotADict,
    /// An attribute value had the wrong bencode type for its field.
    #[error("attribute {0} has wrong type")]
    WrongAttributeType(&'static str),
}

/// The five reference types a Syndie URI may carry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefType {
    /// A plain external URL.
    Url,
    /// A channel reference.
    Channel,
    /// A saved search.
    Search,
    /// An archive reference.
    Archive,
    /// Freeform text.
    Text,
}

impl RefType {
    fn as_str(self) -> &'static str {
        match self {
            RefType::Url => "url",
            RefType::Channel => "channel",
            RefType::Search => "search",
            RefType::Archive => "archive",
            RefType::Text => "text",
        }
    }

    fn parse(s: &str) -> Option<RefType> {
        match s.to_ascii_lowercase().as_str() {
            "url" => Some(RefType::Url),
            "channel" => Some(RefType::Channel),
            "search" => Some(RefType::Search),
            "archive" => Some(RefType::Archive),
            "text" => Some(RefType::Text),
            _ => None,
        }
    }
}

/// A decoded Syndie URI: a ref type plus its optional bencoded attributes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Uri {
    /// `None` until set by [`decode_uri`] or the caller.
    pub ref_type: Option<RefType>,
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub desc: Option<String>,
    /// Tags.
    pub tag: Vec<String>,
    /// Author identity.
    pub author: Option<String>,
    /// Network identifier.
    pub net: Option<String>,
    /// Read key algorithm.
    pub read_key_type: Option<String>,
    /// Read key data.
    pub read_key_data: Option<String>,
    /// Post key algorithm.
    pub post_key_type: Option<String>,
    /// Post key data.
    pub post_key_data: Option<String>,
    /// External URL.
    pub url: Option<String>,
    /// Channel identifier.
    pub channel: Option<String>,
    /// Message id.
    pub message_id: Option<i64>,
    /// Page number.
    pub page: Option<i64>,
    /// Attachment number.
    pub attachment: Option<i64>,
    /// Search scope.
    pub scope: Vec<String>,
    /// Post-by scope.
    pub post_by_scope: Vec<String>,
    /// Age filter.
    pub age: Option<i64>,
    /// Local age filter.
    pub age_local: Option<i64>,
    /// Unread-only filter.
    pub unread_only: bool,
    /// Tags to include.
    pub tag_include: Vec<String>,
    /// Tags required.
    pub tag_require: Vec<String>,
    /// Tags to exclude.
    pub tag_exclude: Vec<String>,
    /// Whether to tag messages.
    pub tag_messages: bool,
    /// Minimum page.
    pub page_min: Option<i64>,
    /// Maximum page.
    pub page_max: Option<i64>,
    /// Minimum attachment count.
    pub attach_min: Option<i64>,
    /// Maximum attachment count.
    pub attach_max: Option<i64>,
    /// Minimum reference count.
    pub ref_min: Option<i64>,
    /// Maximum reference count.
    pub ref_max: Option<i64>,
    /// Minimum key count.
    pub key_min: Option<i64>,
    /// Maximum key count.
    pub key_max: Option<i64>,
    /// Whether the target is encrypted.
    pub encrypted: bool,
    /// Whether passphrase-based encryption is used.
    pub pbe: bool,
    /// Whether the target is private.
    pub private: bool,
    /// Whether the target is public.
    pub public: bool,
    /// Whether the reference is authorized.
    pub authorized: bool,
    /// Whether to thread results.
    pub threaded: bool,
    /// Search keyword.
    pub keyword: Option<String>,
    /// Free body text.
    pub body: Option<String>,
}

fn trim_syndie_uri(s: &str) -> &str {
    if let Some(rest) = s.strip_prefix("urn:syndie:") {
        return rest;
    }
    if let Some(rest) = s.strip_prefix("urn:") {
        return rest;
    }
    if let Some(rest) = s.strip_prefix("syndie:") {
        return rest;
    }
    s
}

fn str_attr(dict: &BTreeMap<Vec<u8>, Value>, key: &'static str) -> Result<Option<String>, UriError> {
    match dict.get(key.as_bytes()) {
        None => Ok(None),
        Some(Value::Bytes(b)) => Ok(Some(String::from_utf8_lossy(b).into_owned())),
        Some(_) => Err(UriError::WrongAttributeType(key)),
    }
}

fn int_attr(dict: &BTreeMap<Vec<u8>, Value>, key: &'static str) -> Result<Option<i64>, UriError> {
    match dict.get(key.as_bytes()) {
        None => Ok(None),
        Some(Value::Int(n)) => Ok(Some(*n)),
        Some(_) => Err(UriError::WrongAttributeType(key)),
    }
}

fn bool_attr(dict: &BTreeMap<Vec<u8>, Value>, key: &'static str) -> Result<bool, UriError> {
    match dict.get(key.as_bytes()) {
        None => Ok(false),
        Some(Value::Int(n)) => Ok(*n != 0),
        Some(_) => Err(UriError::WrongAttributeType(key)),
    }
}

fn list_attr(dict: &BTreeMap<Vec<u8>, Value>, key: &'static str) -> Result<Vec<String>, UriError> {
    match dict.get(key.as_bytes()) {
        None => Ok(Vec::new()),
        Some(Value::List(items)) => items
            .iter()
            .map(|v| match v {
                Value::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
                _ => Err(UriError::WrongAttributeType(key)),
            })
            .collect(),
        Some(_) => Err(UriError::WrongAttributeType(key)),
    }
}

/// Decodes a `urn:syndie:<refType>:<bencoded-attrs>` URI string.
///
/// Accepts the bare `<refType>:<attrs>` shape too, since `urn:`/`syndie:` are only
/// optional aliases. Tolerates both the `attatchment` and `attachment` spellings of
/// the attachment-index key.
pub fn decode_uri(input: &str) -> Result<Uri, UriError> {
    if input.len() < 3 {
        return Err(UriError::TooShort);
    }
    let trimmed = trim_syndie_uri(input);
    let (ref_type_str, rest) = trimmed.split_once(':').ok_or(UriError::MissingRefType)?;
    let ref_type = RefType::parse(ref_type_str).ok_or_else(|| UriError::InvalidRefType(ref_type_str.to_string()))?;

    let mut uri = Uri {
        ref_type: Some(ref_type),
        ..Default::default()
    };

    if rest.is_empty() {
        return Ok(uri);
    }

    let value = bencode::decode(rest.as_bytes())?;
    let dict = value.as_dict().ok_or(UriError::NotADict)?;

    uri.name = str_attr(dict, "name")?;
    uri.desc = str_attr(dict, "desc")?;
    uri.tag = list_attr(dict, "tag")?;
    uri.author = str_attr(dict, "author")?;
    uri.net = str_attr(dict, "net")?;
    uri.read_key_type = str_attr(dict, "readKeyType")?;
    uri.read_key_data = str_attr(dict, "readKeyData")?;
    uri.post_key_type = str_attr(dict, "postKeyType")?;
    uri.post_key_data = str_attr(dict, "postKeyData")?;
    uri.url = str_attr(dict, "url")?;
    uri.channel = str_attr(dict, "channel")?;
    uri.message_id = int_attr(dict, "messageId")?;
    uri.page = int_attr(dict, "page")?;
    // Historical spelling first, canonical spelling wins if both are present.
    uri.attachment = int_attr(dict, "attatchment")?.or(int_attr(dict, "attachment")?);
    uri.scope = list_attr(dict, "scope")?;
    uri.post_by_scope = list_attr(dict, "postbyscope")?;
    uri.age = int_attr(dict, "age")?;
    uri.age_local = int_attr(dict, "agelocal")?;
    uri.unread_only = bool_attr(dict, "unreadonly")?;
    uri.tag_include = list_attr(dict, "taginclude")?;
    uri.tag_require = list_attr(dict, "tagrequire")?;
    uri.tag_exclude = list_attr(dict, "tagexclude")?;
    uri.tag_messages = bool_attr(dict, "tagmessages")?;
    uri.page_min = int_attr(dict, "pagemin")?;
    uri.page_max = int_attr(dict, "pagemax")?;
    uri.attach_min = int_attr(dict, "attachmin")?;
    uri.attach_max = int_attr(dict, "attachmax")?;
    uri.ref_min = int_attr(dict, "refmin")?;
    uri.ref_max = int_attr(dict, "refmax")?;
    uri.key_min = int_attr(dict, "keymin")?;
    uri.key_max = int_attr(dict, "keymax")?;
    uri.encrypted = bool_attr(dict, "encrypted")?;
    uri.pbe = bool_attr(dict, "pbe")?;
    uri.private = bool_attr(dict, "private")?;
    uri.public = bool_attr(dict, "public")?;
    uri.authorized = bool_attr(dict, "authorized")?;
    uri.threaded = bool_attr(dict, "threaded")?;
    uri.keyword = str_attr(dict, "keyword")?;
    uri.body = str_attr(dict, "body")?;

    Ok(uri)
}

fn put_str(dict: &mut BTreeMap<Vec<u8>, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            dict.insert(key.as_bytes().to_vec(), Value::Bytes(v.clone().into_bytes()));
        }
    }
}

fn put_int(dict: &mut BTreeMap<Vec<u8>, Value>, key: &str, value: Option<i64>) {
    if let Some(v) = value {
        if v != 0 {
            dict.insert(key.as_bytes().to_vec(), Value::Int(v));
        }
    }
}

fn put_bool(dict: &mut BTreeMap<Vec<u8>, Value>, key: &str, value: bool) {
    if value {
        dict.insert(key.as_bytes().to_vec(), Value::Int(1));
    }
}

fn put_list(dict: &mut BTreeMap<Vec<u8>, Value>, key: &str, value: &[String]) {
    if !value.is_empty() {
        let items = value.iter().map(|s| Value::Bytes(s.clone().into_bytes())).collect();
        dict.insert(key.as_bytes().to_vec(), Value::List(items));
    }
}

/// Encodes a URI back into its `urn:syndie:<refType>:<bencoded-attrs>` string form.
///
/// Always emits the canonical `attachment` spelling, never the historical
/// `attatchment` one, even if the value was decoded from the latter.
pub fn encode_uri(uri: &Uri) -> Result<String, UriError> {
    let ref_type = uri.ref_type.ok_or(UriError::MissingRefType)?;
    let mut dict = BTreeMap::new();

    put_str(&mut dict, "name", &uri.name);
    put_str(&mut dict, "desc", &uri.desc);
    put_list(&mut dict, "tag", &uri.tag);
    put_str(&mut dict, "author", &uri.author);
    put_str(&mut dict, "net", &uri.net);
    put_str(&mut dict, "readKeyType", &uri.read_key_type);
    put_str(&mut dict, "readKeyData", &uri.read_key_data);
    put_str(&mut dict, "postKeyType", &uri.post_key_type);
    put_str(&mut dict, "postKeyData", &uri.post_key_data);
    put_str(&mut dict, "url", &uri.url);
    put_str(&mut dict, "channel", &uri.channel);
    put_int(&mut dict, "messageId", uri.message_id);
    put_int(&mut dict, "page", uri.page);
    put_int(&mut dict, "attachment", uri.attachment);
    put_list(&mut dict, "scope", &uri.scope);
    put_list(&mut dict, "postbyscope", &uri.post_by_scope);
    put_int(&mut dict, "age", uri.age);
    put_int(&mut dict, "agelocal", uri.age_local);
    put_bool(&mut dict, "unreadonly", uri.unread_only);
    put_list(&mut dict, "taginclude", &uri.tag_include);
    put_list(&mut dict, "tagrequire", &uri.tag_require);
    put_list(&mut dict, "tagexclude", &uri.tag_exclude);
    put_bool(&mut dict, "tagmessages", uri.tag_messages);
    put_int(&mut dict, "pagemin", uri.page_min);
    put_int(&mut dict, "pagemax", uri.page_max);
    put_int(&mut dict, "attachmin", uri.attach_min);
    put_int(&mut dict, "attachmax", uri.attach_max);
    put_int(&mut dict, "refmin", uri.ref_min);
    put_int(&mut dict, "refmax", uri.ref_max);
    put_int(&mut dict, "keymin", uri.key_min);
    put_int(&mut dict, "keymax", uri.key_max);
    put_bool(&mut dict, "encrypted", uri.encrypted);
    put_bool(&mut dict, "pbe", uri.pbe);
    put_bool(&mut dict, "private", uri.private);
    put_bool(&mut dict, "public", uri.public);
    put_bool(&mut dict, "authorized", uri.authorized);
    put_bool(&mut dict, "threaded", uri.threaded);
    put_str(&mut dict, "keyword", &uri.keyword);
    put_str(&mut dict, "body", &uri.body);

    let attrs = bencode::encode(&Value::Dict(dict));
    let attrs = String::from_utf8_lossy(&attrs);
    Ok(format!("urn:syndie:{}:{}", ref_type.as_str(), attrs))
}

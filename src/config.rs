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

//! A serde/toml-deserializable mirror of [`crate::pipeline::DecodeOptions`],
//! giving every decode knob a config-file form the way the teacher's
//! `NodeConfig`/`HttpConfig` structs do for node settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::DecodeOptions;

const DEFAULT_MAX_ENVELOPE_SIZE: u64 = 64 * 1024 * 1024;
const DEFAULT_MAX_INNER_SIZE: u64 = 64 * 1024 * 1024;

fn default_true() -> bool {
    true
}

fn default_max_envelope_size() -> u64 {
    DEFAULT_MAX_ENVELOPE_SIZE
}

fn default_max_inner_size() -> u64 {
    DEFAULT_MAX_INNER_SIZE
}

/// Errors turning a [`DecodeConfig`] into [`DecodeOptions`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither the config file nor a caller override supplied a body key.
    #[error("no body_key supplied in config or on the command line")]
    MissingBodyKey,
    /// The TOML document could not be parsed.
    #[error("invalid config toml: {0}")]
    Toml(#[from] toml::de::Error),
}

/// File-backed mirror of [`DecodeOptions`]. Every field defaults to the same
/// value `DecodeOptions::default()` would use, so a partial TOML document is
/// always valid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// I2P-base64 AES-256 body key. Usually supplied on the command line instead
    /// and left unset here, to avoid persisting key material to disk.
    #[serde(default)]
    pub body_key: Option<String>,
    /// Mirrors `DecodeOptions::require_signature_verification`.
    #[serde(default = "default_true")]
    pub require_signature_verification: bool,
    /// Mirrors `DecodeOptions::require_hmac`.
    #[serde(default = "default_true")]
    pub require_hmac: bool,
    /// Mirrors `DecodeOptions::max_envelope_size`.
    #[serde(default = "default_max_envelope_size")]
    pub max_envelope_size: u64,
    /// Mirrors `DecodeOptions::max_inner_size`.
    #[serde(default = "default_max_inner_size")]
    pub max_inner_size: u64,
    /// Mirrors `DecodeOptions::strict_unknown_keys`.
    #[serde(default = "default_true")]
    pub strict_unknown_keys: bool,
}

impl Default for DecodeConfig {
    /// Matches the `#[serde(default = "...")]` attributes above field-for-field —
    /// the derived `Default` would silently zero `max_envelope_size`/
    /// `max_inner_size` and flip the `require_*`/`strict_unknown_keys` booleans to
    /// `false`, which is not what an absent `--config` should mean.
    fn default() -> Self {
        Self {
            body_key: None,
            require_signature_verification: default_true(),
            require_hmac: default_true(),
            max_envelope_size: default_max_envelope_size(),
            max_inner_size: default_max_inner_size(),
            strict_unknown_keys: default_true(),
        }
    }
}

impl DecodeConfig {
    /// Parses a `DecodeConfig` from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Builds [`DecodeOptions`], preferring `body_key_override` (e.g. a CLI flag)
    /// over the config file's own `body_key`.
    pub fn into_options(self, body_key_override: Option<String>) -> Result<DecodeOptions, ConfigError> {
        let body_key = body_key_override
            .or(self.body_key)
            .ok_or(ConfigError::MissingBodyKey)?;
        Ok(DecodeOptions {
            body_key,
            require_signature_verification: self.require_signature_verification,
            require_hmac: self.require_hmac,
            max_envelope_size: self.max_envelope_size,
            max_inner_size: self.max_inner_size,
            strict_unknown_keys: self.strict_unknown_keys,
            cancel: None,
        })
    }
}

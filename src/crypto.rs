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

//! Cryptographic composition for the enclosure pipeline (§4.1 steps 5 and 11):
//! I2P base64, AES-256-CBC decryption, and HMAC-SHA256 key derivation/verification.
//!
//! No primitive is implemented here — AES, SHA-256, and HMAC are black-box
//! operations from `aes`/`cbc` and `ring`, composed exactly as the wire format
//! requires.

use aes::Aes256;
use base64::alphabet::Alphabet;
use base64::engine::{general_purpose::PAD, GeneralPurpose};
use base64::Engine;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use thiserror::Error;
use zeroize::Zeroizing;

/// Cryptographic failures in the decode pipeline.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// `body_key` was not valid I2P base64.
    #[error("invalid I2P base64 encoding")]
    InvalidKeyEncoding,
    /// The decoded key was not exactly 32 bytes (AES-256).
    #[error("body key must decode to 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    /// AES-CBC initialization or decryption failed.
    #[error("AES-CBC cipher error")]
    Cipher,
    /// The computed HMAC did not match the trailing 32 bytes of the envelope.
    #[error("HMAC verification failed")]
    HmacMismatch,
}

const I2P_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-~";

fn i2p_engine() -> GeneralPurpose {
    let alphabet = Alphabet::new(I2P_ALPHABET).expect("I2P alphabet is a valid base64 alphabet");
    GeneralPurpose::new(&alphabet, PAD)
}

/// Decodes a string in the I2P base64 alphabet (`A-Z a-z 0-9 - ~`).
pub fn i2p_base64_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    i2p_engine()
        .decode(s.trim())
        .map_err(|_| CryptoError::InvalidKeyEncoding)
}

/// Encodes bytes in the I2P base64 alphabet (`A-Z a-z 0-9 - ~`).
pub fn i2p_base64_encode(bytes: &[u8]) -> String {
    i2p_engine().encode(bytes)
}

/// Decodes and length-checks a 32-byte AES-256 body key from its I2P-base64 form.
pub fn decode_body_key(body_key: &str) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let raw = i2p_base64_decode(body_key)?;
    if raw.len() != 32 {
        return Err(CryptoError::InvalidKeyLength(raw.len()));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&raw);
    Ok(Zeroizing::new(out))
}

type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Decrypts `ciphertext` in place with AES-256-CBC under `key`/`iv`.
///
/// `ciphertext.len()` must already be a multiple of the AES block size (16); the
/// Syndie wire format never applies a padding scheme on top of CBC — the
/// plaintext's own leading non-zero padding (§4.1 step 6) is the application's
/// concern, not the cipher's.
pub fn decrypt_aes_cbc(key: &[u8; 32], iv: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let decryptor = Aes256CbcDec::new(key.into(), iv.into());
    let mut buf = ciphertext.to_vec();
    let plain_len = decryptor
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| CryptoError::Cipher)?
        .len();
    buf.truncate(plain_len);
    Ok(buf)
}

/// Derives the HMAC key as `SHA256(body_key_bytes || iv)` (§4.1 step 11).
pub fn derive_hmac_key(body_key: &[u8], iv: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut preimage = Vec::with_capacity(body_key.len() + iv.len());
    preimage.extend_from_slice(body_key);
    preimage.extend_from_slice(iv);
    let digest = ring::digest::digest(&ring::digest::SHA256, &preimage);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    Zeroizing::new(out)
}

/// Verifies `tag` as HMAC-SHA256 over `data` under `hmac_key`, in constant time.
pub fn verify_hmac(hmac_key: &[u8], data: &[u8], tag: &[u8]) -> Result<(), CryptoError> {
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, hmac_key);
    ring::hmac::verify(&key, data, tag).map_err(|_| CryptoError::HmacMismatch)
}

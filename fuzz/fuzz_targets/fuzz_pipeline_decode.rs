// Copyright (c) 2026 Amunchain
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use syndie_codec::crypto::i2p_base64_encode;
use syndie_codec::{decode, DecodeOptions};

#[derive(Clone, Debug, Arbitrary)]
struct Input {
    body_key: [u8; 32],
    file: Vec<u8>,
}

fuzz_target!(|inp: Input| {
    let options = DecodeOptions {
        body_key: i2p_base64_encode(&inp.body_key),
        ..DecodeOptions::default()
    };
    // Best-effort: the pipeline must return a typed error rather than panic
    // on arbitrary input, regardless of whether the key happens to match.
    let _ = decode(Cursor::new(inp.file), &options);
});

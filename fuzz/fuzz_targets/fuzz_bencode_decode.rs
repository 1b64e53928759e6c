// Copyright (c) 2026 Amunchain
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Best-effort: ensure bencode decoding never panics on arbitrary bytes.
    let _ = syndie_codec::bencode::decode(data);
});

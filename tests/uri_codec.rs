// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use syndie_codec::{encode_uri, parse_uri, RefType, Uri};

#[test]
fn uri_decode_scenario_matches_spec() {
    let uri = parse_uri("urn:syndie:channel:d7:channel4:abcde").unwrap();
    assert_eq!(uri.ref_type, Some(RefType::Channel));
    assert_eq!(uri.channel.as_deref(), Some("abcd"));
}

#[test]
fn uri_alias_prefixes_decode_identically() {
    let url = "https://x/e";
    let attrs = format!("d3:url{}:{}e", url.len(), url);
    let a = parse_uri(&format!("urn:syndie:url:{attrs}")).unwrap();
    let b = parse_uri(&format!("urn:url:{attrs}")).unwrap();
    let c = parse_uri(&format!("syndie:url:{attrs}")).unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.url.as_deref(), Some(url));
}

#[test]
fn encode_is_stable_across_invocations() {
    let uri = Uri {
        ref_type: Some(RefType::Search),
        name: Some("a search".to_string()),
        tag: vec!["one".to_string(), "two".to_string()],
        ..Uri::default()
    };
    let first = encode_uri(&uri).unwrap();
    let second = encode_uri(&uri).unwrap();
    assert_eq!(first, second);
}

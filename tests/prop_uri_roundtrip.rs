// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use proptest::prelude::*;
use syndie_codec::{encode_uri, parse_uri, RefType, Uri};

fn ref_type_strategy() -> impl Strategy<Value = RefType> {
    prop_oneof![
        Just(RefType::Url),
        Just(RefType::Channel),
        Just(RefType::Search),
        Just(RefType::Archive),
        Just(RefType::Text),
    ]
}

// Non-empty: `encode_uri` omits empty optional strings, so an empty value
// would not round-trip back to `Some(String::new())`.
fn ascii_no_colon() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,24}"
}

proptest! {
    #[test]
    fn decode_of_encode_is_identity(
        ref_type in ref_type_strategy(),
        name in proptest::option::of(ascii_no_colon()),
        tag in proptest::collection::vec(ascii_no_colon(), 0..4),
        message_id in proptest::option::of(1i64..1_000_000),
        encrypted in any::<bool>(),
    ) {
        let uri = Uri {
            ref_type: Some(ref_type),
            name,
            tag,
            message_id,
            encrypted,
            ..Uri::default()
        };
        let encoded = encode_uri(&uri).unwrap();
        let decoded = parse_uri(&encoded).unwrap();
        prop_assert_eq!(decoded, uri);
    }

    #[test]
    fn encoded_form_is_byte_stable(name in ascii_no_colon()) {
        let uri = Uri {
            ref_type: Some(RefType::Channel),
            name: Some(name),
            ..Uri::default()
        };
        let first = encode_uri(&uri).unwrap();
        let second = encode_uri(&uri).unwrap();
        prop_assert_eq!(first, second);
    }
}

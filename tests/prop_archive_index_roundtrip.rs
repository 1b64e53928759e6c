// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use proptest::prelude::*;
use syndie_codec::{decode_archive_index, encode_archive_index, ArchiveIndex, ChannelEntry, MessageEntry};

fn channel_strategy() -> impl Strategy<Value = ChannelEntry> {
    (any::<[u8; 32]>(), any::<u64>(), any::<u8>())
        .prop_map(|(hash, edition, flags)| ChannelEntry { hash, edition, flags })
}

proptest! {
    #[test]
    fn decode_of_encode_is_identity(
        archive_flags in any::<u16>(),
        admin_channel in any::<u32>(),
        channels in proptest::collection::vec(channel_strategy(), 1..8),
        message_seeds in proptest::collection::vec((any::<u64>(), any::<u8>()), 0..8),
    ) {
        let n = channels.len() as u32;
        let messages = message_seeds
            .into_iter()
            .map(|(id, flags)| MessageEntry {
                id,
                scope_channel: (id as u32) % n,
                target_channel: (flags as u32) % n,
                flags,
            })
            .collect();

        let index = ArchiveIndex {
            archive_flags,
            admin_channel,
            alt_uris: vec![],
            channels,
            messages,
        };
        let bytes = encode_archive_index(&index);
        let decoded = decode_archive_index(&bytes).unwrap();
        prop_assert_eq!(decoded, index);
    }
}

// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use syndie_codec::{decode_archive_index, derive_urls, encode_archive_index, ArchiveIndex, ArchiveIndexError, ChannelEntry, MessageEntry};

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}
fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}
fn push_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Builds the exact byte layout from spec §8 scenario 5: one channel (edition
/// 7), one message (id 5, scope/target = channel 0).
fn seed_scenario_bytes(hash: [u8; 32]) -> Vec<u8> {
    let mut bytes = Vec::new();
    push_u16(&mut bytes, 0); // archive_flags
    push_u32(&mut bytes, 0); // admin_channel
    bytes.push(0); // num_alt_uris
    push_u32(&mut bytes, 1); // num_channels
    bytes.extend_from_slice(&hash);
    push_u64(&mut bytes, 7); // channel_edition
    bytes.push(0); // channel_flags
    push_u32(&mut bytes, 1); // num_messages
    push_u64(&mut bytes, 5); // message_id
    push_u32(&mut bytes, 0); // scope_channel
    push_u32(&mut bytes, 0); // target_channel
    bytes.push(0); // message_flags
    bytes
}

#[test]
fn decodes_seed_scenario_from_spec() {
    let hash = [0xee; 32];
    let bytes = seed_scenario_bytes(hash);
    let index = decode_archive_index(&bytes).unwrap();

    assert_eq!(index.channels.len(), 1);
    assert_eq!(index.channels[0].edition, 7);
    assert_eq!(index.messages.len(), 1);
    assert_eq!(index.messages[0].id, 5);
    assert_eq!(index.messages[0].scope_channel, 0);
    assert_eq!(index.messages[0].target_channel, 0);

    let urls = derive_urls(&index);
    assert_eq!(urls.len(), 2);
    assert!(urls[0].ends_with("/meta.syndie"));
    assert!(urls[1].ends_with("/5.syndie"));
}

#[test]
fn rejects_channel_count_over_ten_thousand() {
    let mut bytes = Vec::new();
    push_u16(&mut bytes, 0);
    push_u32(&mut bytes, 0);
    bytes.push(0);
    push_u32(&mut bytes, 10_001);

    let err = decode_archive_index(&bytes).unwrap_err();
    assert!(matches!(err, ArchiveIndexError::TooManyChannels));
}

#[test]
fn encode_then_decode_preserves_every_field() {
    let index = ArchiveIndex {
        archive_flags: 0x0102,
        admin_channel: 3,
        alt_uris: vec!["urn:syndie:archive:d3:fooi1ee".to_string()],
        channels: vec![
            ChannelEntry { hash: [1; 32], edition: 1, flags: 0 },
            ChannelEntry { hash: [2; 32], edition: 2, flags: 1 },
        ],
        messages: vec![MessageEntry {
            id: 99,
            scope_channel: 0,
            target_channel: 1,
            flags: 0,
        }],
    };
    let bytes = encode_archive_index(&index);
    let decoded = decode_archive_index(&bytes).unwrap();
    assert_eq!(decoded, index);
}

#[test]
fn rejects_out_of_range_target_channel() {
    let index = ArchiveIndex {
        archive_flags: 0,
        admin_channel: 0,
        alt_uris: vec![],
        channels: vec![ChannelEntry { hash: [0; 32], edition: 0, flags: 0 }],
        messages: vec![MessageEntry { id: 1, scope_channel: 0, target_channel: 5, flags: 0 }],
    };
    let bytes = encode_archive_index(&index);
    let err = decode_archive_index(&bytes).unwrap_err();
    assert!(matches!(err, ArchiveIndexError::TargetChannelOutOfRange(5, 1)));
}

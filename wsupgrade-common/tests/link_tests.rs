// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for serial link framing (requires the `std` feature).

#![cfg(feature = "std")]

use wsupgrade_common::link::{FrameAccumulator, LinkFrame, MAX_LINK_FRAME_SIZE, MAX_LINK_PAYLOAD};
use wsupgrade_common::protocol::APP_INFO;

fn feed(acc: &mut FrameAccumulator, bytes: &[u8]) -> Vec<LinkFrame> {
    bytes
        .iter()
        .filter_map(|&b| acc.push(b))
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn test_encoded_frame_ends_with_single_delimiter() {
    let encoded = LinkFrame::Control(vec![0x02, 0x00, 0x01, 0x00, 0x00])
        .to_vec()
        .unwrap();

    assert_eq!(encoded.last(), Some(&0x00));
    assert!(encoded[..encoded.len() - 1].iter().all(|&b| b != 0));
}

#[test]
fn test_accumulator_splits_back_to_back_frames() {
    let frames = vec![
        LinkFrame::Subscribe,
        LinkFrame::Control(vec![0x01]),
        LinkFrame::Data(vec![0x00; 20]),
        LinkFrame::Notify(0x00),
        LinkFrame::AppInfo(APP_INFO),
    ];
    let mut stream = Vec::new();
    for frame in &frames {
        stream.extend(frame.to_vec().unwrap());
    }

    let mut acc = FrameAccumulator::new();
    assert_eq!(feed(&mut acc, &stream), frames);
}

#[test]
fn test_accumulator_ignores_stray_delimiters() {
    let mut stream = vec![0x00, 0x00];
    stream.extend(LinkFrame::ReadAppInfo.to_vec().unwrap());
    stream.push(0x00);

    let mut acc = FrameAccumulator::new();
    assert_eq!(feed(&mut acc, &stream), vec![LinkFrame::ReadAppInfo]);
}

#[test]
fn test_accumulator_discards_oversized_frame_and_recovers() {
    let mut stream = vec![0x42; MAX_LINK_FRAME_SIZE + 10];
    stream.push(0x00);
    stream.extend(LinkFrame::Notify(0x01).to_vec().unwrap());

    let mut acc = FrameAccumulator::new();
    assert_eq!(feed(&mut acc, &stream), vec![LinkFrame::Notify(0x01)]);
}

#[test]
fn test_decode_garbage_is_an_error() {
    let mut acc = FrameAccumulator::new();
    let results: Vec<_> = [0x02, 0xFF, 0x00]
        .iter()
        .filter_map(|&b| acc.push(b))
        .collect();

    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}

#[test]
fn test_largest_data_payload_fits_one_link_frame() {
    let mut acc = FrameAccumulator::new();
    for fill in [0x00u8, 0xAB] {
        let frame = LinkFrame::Data(vec![fill; MAX_LINK_PAYLOAD]);
        let encoded = frame.to_vec().unwrap();
        assert!(encoded.len() <= MAX_LINK_FRAME_SIZE);

        assert_eq!(feed(&mut acc, &encoded), vec![frame]);
    }
}

#[test]
fn test_payload_past_limit_does_not_encode() {
    let frame = LinkFrame::Data(vec![0xAB; MAX_LINK_FRAME_SIZE]);
    assert!(frame.to_vec().is_err());
}

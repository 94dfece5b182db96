// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial link framing between the uploader and the peripheral emulator.
//!
//! Each GATT operation becomes one `LinkFrame`, serialized with postcard and
//! COBS-framed so that `0x00` delimits frames on the wire.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for one encoded frame, delimiter included.
pub const MAX_LINK_FRAME_SIZE: usize = 256;

/// Largest `Data` payload that still encodes within `MAX_LINK_FRAME_SIZE`.
///
/// Leaves room for the variant tag, the varint length, COBS overhead and the
/// delimiter.
pub const MAX_LINK_PAYLOAD: usize = MAX_LINK_FRAME_SIZE - 8;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum LinkFrame {
    /// Central subscribed to control-point notifications.
    Subscribe,
    /// Write to the control-point characteristic.
    Control(Vec<u8>),
    /// Write to the data characteristic.
    Data(Vec<u8>),
    /// Read of the app-info characteristic.
    ReadAppInfo,
    AppInfo([u8; 4]),
    /// Control-point notification (acknowledgement byte).
    Notify(u8),
}

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("failed to encode link frame: {0}")]
    Encode(postcard::Error),
    #[error("failed to decode link frame: {0}")]
    Decode(postcard::Error),
}

impl LinkFrame {
    /// Encode into `buf`, returning the COBS frame including its delimiter.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], LinkError> {
        postcard::to_slice_cobs(self, buf).map_err(LinkError::Encode)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, LinkError> {
        let mut buf = [0u8; MAX_LINK_FRAME_SIZE];
        Ok(self.encode(&mut buf)?.to_vec())
    }

    /// Decode one COBS frame (with or without its trailing delimiter).
    ///
    /// The buffer is decoded in place.
    pub fn decode(frame: &mut [u8]) -> Result<Self, LinkError> {
        postcard::from_bytes_cobs(frame).map_err(LinkError::Decode)
    }
}

/// Splits a byte stream into COBS frames on `0x00`.
#[derive(Debug, Default)]
pub struct FrameAccumulator {
    buf: Vec<u8>,
    overflowed: bool,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns a decoded frame when a delimiter closes one.
    ///
    /// Frames that grow past `MAX_LINK_FRAME_SIZE` are discarded up to the
    /// next delimiter, as are frames that fail to decode.
    pub fn push(&mut self, byte: u8) -> Option<Result<LinkFrame, LinkError>> {
        if byte != 0x00 {
            if self.buf.len() < MAX_LINK_FRAME_SIZE {
                self.buf.push(byte);
            } else {
                self.overflowed = true;
            }
            return None;
        }

        if self.overflowed {
            log::warn!("discarding oversized link frame");
            self.buf.clear();
            self.overflowed = false;
            return None;
        }
        if self.buf.is_empty() {
            return None;
        }

        let result = LinkFrame::decode(&mut self.buf);
        self.buf.clear();
        Some(result)
    }
}

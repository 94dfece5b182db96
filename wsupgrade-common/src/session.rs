// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Per-connection upload session.
//!
//! A `Session` is plain data owned by whoever owns the connection. Mutation
//! goes through the transition methods below, which the engine only calls
//! after a frame has been fully validated.

use core::fmt;

use crc::{Crc, Digest, CRC_32_ISO_HDLC};

use crate::protocol::UploadState;

/// CRC-32/ISO-HDLC, the same variant zlib and the bootloader tooling use.
pub static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub struct Session {
    state: UploadState,
    expected_length: Option<u32>,
    received_bytes: u32,
    digest: Digest<'static, u32>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: UploadState::Idle,
            expected_length: None,
            received_bytes: 0,
            digest: CRC32.digest(),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Announced image length; `Some` only while downloading.
    pub fn expected_length(&self) -> Option<u32> {
        self.expected_length
    }

    pub fn received_bytes(&self) -> u32 {
        self.received_bytes
    }

    /// Back to Idle, dropping any partial download.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn prepare(&mut self) {
        self.state = UploadState::Prepared;
    }

    pub(crate) fn begin_download(&mut self, total_length: u32) {
        self.state = UploadState::Downloading;
        self.expected_length = Some(total_length);
        self.received_bytes = 0;
        self.digest = CRC32.digest();
    }

    pub(crate) fn absorb(&mut self, data: &[u8]) {
        self.digest.update(data);
        self.received_bytes = self.received_bytes.saturating_add(data.len() as u32);
    }

    /// Leave Downloading, returning `(expected_length, received_bytes, crc)`.
    pub(crate) fn finish(&mut self) -> (u32, u32, u32) {
        let expected = self.expected_length.take().unwrap_or(0);
        let received = self.received_bytes;
        let crc = core::mem::replace(&mut self.digest, CRC32.digest()).finalize();
        self.state = UploadState::Idle;
        self.received_bytes = 0;
        (expected, received, crc)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("expected_length", &self.expected_length)
            .field("received_bytes", &self.received_bytes)
            .finish_non_exhaustive()
    }
}

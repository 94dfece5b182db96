// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Wire types for the WS-Upgrade control point.
//!
//! This module provides types that work in both `no_std` (embedded) and `std` (host) environments.
//! All multi-byte fields on the wire are little-endian.

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

// --- GATT identifiers ---

/// WS-Upgrade primary service.
pub const SERVICE_UUID: &str = "9E5D1E47-5C13-43A0-8635-82AD38A1386F";

/// Control point characteristic (write, notify, indicate).
pub const CONTROL_POINT_UUID: &str = "E3DD50BF-F7A7-4E99-838E-570A086C666B";

/// Data characteristic (write).
pub const DATA_UUID: &str = "92E86C7A-D961-4091-B74F-2409E72EFE36";

/// App-info characteristic (read), konashi flavour.
pub const APP_INFO_UUID: &str = "347F7608-2E2D-47EB-913B-75D4EDC4DE3B";

/// Static app-info blob expected by the upgrade tool.
pub const APP_INFO: [u8; 4] = [0xFF, 0xFF, 0x01, 0x00];

// --- Frame sizes ---

/// Length of a PrepareDownload frame (opcode only).
pub const PREPARE_FRAME_LEN: usize = 1;

/// Length of a Download or Verify frame (opcode + u32).
pub const WORD_FRAME_LEN: usize = 5;

/// Largest control frame on the wire.
pub const MAX_CONTROL_FRAME_LEN: usize = WORD_FRAME_LEN;

/// Largest single write on the source transport (BLE ATT payload).
pub const DEFAULT_MAX_DATA_FRAME_LEN: usize = 20;

// --- Upload state ---

/// Position in the upload cycle. There is no terminal state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Prepared,
    Downloading,
}

impl UploadState {
    /// The only opcode legal in this state.
    pub const fn expected_opcode(self) -> Opcode {
        match self {
            UploadState::Idle => Opcode::PrepareDownload,
            UploadState::Prepared => Opcode::Download,
            UploadState::Downloading => Opcode::Verify,
        }
    }
}

// --- Opcodes ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    PrepareDownload = 1,
    Download = 2,
    Verify = 3,
}

impl Opcode {
    /// Exact frame length required for this opcode.
    pub const fn frame_len(self) -> usize {
        match self {
            Opcode::PrepareDownload => PREPARE_FRAME_LEN,
            Opcode::Download | Opcode::Verify => WORD_FRAME_LEN,
        }
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }
}

// --- Control commands ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    PrepareDownload,
    Download { total_length: u32 },
    Verify { crc32: u32 },
}

impl ControlCommand {
    pub const fn opcode(&self) -> Opcode {
        match self {
            ControlCommand::PrepareDownload => Opcode::PrepareDownload,
            ControlCommand::Download { .. } => Opcode::Download,
            ControlCommand::Verify { .. } => Opcode::Verify,
        }
    }

    /// Decode `frame` as the command `expected` demands.
    ///
    /// The opcode byte is checked first, so a well-formed command sent in the
    /// wrong state is an `UnexpectedOpcode`. The length is checked once the
    /// opcode matches; an empty frame is a `MalformedLength`.
    pub fn decode_expected(expected: Opcode, frame: &[u8]) -> Result<Self, FrameError> {
        let Some(&opcode) = frame.first() else {
            return Err(FrameError::MalformedLength {
                expected: expected.frame_len(),
                actual: 0,
            });
        };
        if opcode != expected.byte() {
            return Err(FrameError::UnexpectedOpcode {
                expected: expected.byte(),
                actual: opcode,
            });
        }
        if frame.len() != expected.frame_len() {
            return Err(FrameError::MalformedLength {
                expected: expected.frame_len(),
                actual: frame.len(),
            });
        }

        Ok(match expected {
            Opcode::PrepareDownload => ControlCommand::PrepareDownload,
            Opcode::Download => ControlCommand::Download {
                total_length: read_le_u32(&frame[1..]),
            },
            Opcode::Verify => ControlCommand::Verify {
                crc32: read_le_u32(&frame[1..]),
            },
        })
    }

    /// Encode into wire bytes (used by the uploader side).
    pub fn encode(&self) -> heapless::Vec<u8, MAX_CONTROL_FRAME_LEN> {
        let mut out = heapless::Vec::new();
        // Capacity covers every shape, pushes cannot fail.
        let _ = out.push(self.opcode().byte());
        match *self {
            ControlCommand::PrepareDownload => {}
            ControlCommand::Download { total_length: word }
            | ControlCommand::Verify { crc32: word } => {
                let _ = out.extend_from_slice(&word.to_le_bytes());
            }
        }
        out
    }
}

/// Read a little-endian u32 from the first four bytes of `bytes`.
fn read_le_u32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(word)
}

// --- Acknowledgements ---

/// Status byte notified on the control point.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AckStatus {
    Ok = 0x00,
    /// Strict mode only: computed CRC differs from the Verify field.
    ChecksumMismatch = 0x01,
    /// Strict mode only: CRC matched but the byte count did not.
    LengthMismatch = 0x02,
}

impl AckStatus {
    pub const fn byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(AckStatus::Ok),
            0x01 => Some(AckStatus::ChecksumMismatch),
            0x02 => Some(AckStatus::LengthMismatch),
            _ => None,
        }
    }
}

impl From<AckStatus> for u8 {
    fn from(status: AckStatus) -> Self {
        status.byte()
    }
}

/// How Verify results are reflected in the acknowledgement byte.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AckMode {
    /// Always ack `0x00`; what the existing upgrade tool expects.
    #[default]
    Compatible,
    /// Ack Verify with the real outcome.
    Strict,
}

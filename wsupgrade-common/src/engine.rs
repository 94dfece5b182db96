// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Upload protocol engine.
//!
//! The engine interprets control-point and data frames against a caller-owned
//! [`Session`]:
//! - Idle: only PrepareDownload is legal
//! - Prepared: only Download(length) is legal
//! - Downloading: data frames accumulate, only Verify(crc) is legal
//!
//! The current state alone decides which command may come next. A rejected
//! frame never touches the session.

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::protocol::{AckMode, AckStatus, ControlCommand, UploadState, DEFAULT_MAX_DATA_FRAME_LEN};
use crate::session::Session;

/// Engine tunables.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest data frame the transport can deliver in one write.
    pub max_data_frame_len: usize,
    pub ack_mode: AckMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_data_frame_len: DEFAULT_MAX_DATA_FRAME_LEN,
            ack_mode: AckMode::Compatible,
        }
    }
}

/// Result of a Verify command.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    pub expected_crc: u32,
    pub computed_crc: u32,
    pub expected_length: u32,
    pub received_bytes: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Match,
    ChecksumMismatch,
    LengthMismatch,
}

impl VerifyReport {
    pub fn checksum_matches(&self) -> bool {
        self.expected_crc == self.computed_crc
    }

    pub fn length_matches(&self) -> bool {
        self.expected_length == self.received_bytes
    }

    /// Checksum takes priority over length.
    pub fn outcome(&self) -> VerifyOutcome {
        if !self.checksum_matches() {
            VerifyOutcome::ChecksumMismatch
        } else if !self.length_matches() {
            VerifyOutcome::LengthMismatch
        } else {
            VerifyOutcome::Match
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome() == VerifyOutcome::Match
    }
}

/// What an accepted frame did.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Prepared,
    DownloadStarted { total_length: u32 },
    DataReceived { len: usize, received_bytes: u32 },
    Verified(VerifyReport),
}

/// An accepted frame plus the acknowledgement to notify, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub accepted: Accepted,
    pub ack: Option<AckStatus>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle one control-point write.
    pub fn process_control(
        &self,
        session: &mut Session,
        frame: &[u8],
    ) -> Result<Outcome, FrameError> {
        let state = session.state();
        let command = ControlCommand::decode_expected(state.expected_opcode(), frame)?;

        match (state, command) {
            (UploadState::Idle, ControlCommand::PrepareDownload) => {
                session.prepare();
                log::debug!("{:?}: prepared", state);
                Ok(self.acked(Accepted::Prepared, AckStatus::Ok))
            }
            (UploadState::Prepared, ControlCommand::Download { total_length }) => {
                session.begin_download(total_length);
                log::debug!("{:?}: binary length: {}", state, total_length);
                Ok(self.acked(
                    Accepted::DownloadStarted { total_length },
                    AckStatus::Ok,
                ))
            }
            (UploadState::Downloading, ControlCommand::Verify { crc32 }) => {
                let (expected_length, received_bytes, computed_crc) = session.finish();
                let report = VerifyReport {
                    expected_crc: crc32,
                    computed_crc,
                    expected_length,
                    received_bytes,
                };
                self.log_verify(&report);
                Ok(self.acked(Accepted::Verified(report), self.verify_status(&report)))
            }
            // decode_expected only yields the opcode the state asked for.
            (_, command) => Err(FrameError::UnexpectedOpcode {
                expected: state.expected_opcode().byte(),
                actual: command.opcode().byte(),
            }),
        }
    }

    /// Handle one data-characteristic write. Data frames are never acked.
    pub fn process_data(&self, session: &mut Session, frame: &[u8]) -> Result<Outcome, FrameError> {
        let state = session.state();
        if state != UploadState::Downloading {
            return Err(FrameError::UnexpectedDataFrame { state });
        }

        let max = self.config.max_data_frame_len;
        if frame.len() > max {
            return Err(FrameError::OversizedDataFrame {
                len: frame.len(),
                max,
            });
        }

        session.absorb(frame);
        log::debug!("{:?}: receiving data(length={})", state, frame.len());

        Ok(Outcome {
            accepted: Accepted::DataReceived {
                len: frame.len(),
                received_bytes: session.received_bytes(),
            },
            ack: None,
        })
    }

    /// A new subscriber starts from Idle.
    pub fn on_subscribe(&self, session: &mut Session) {
        if session.state() != UploadState::Idle {
            log::info!(
                "{:?}: subscription reset, dropping {} received bytes",
                session.state(),
                session.received_bytes()
            );
        }
        session.reset();
    }

    fn acked(&self, accepted: Accepted, status: AckStatus) -> Outcome {
        Outcome {
            accepted,
            ack: Some(status),
        }
    }

    fn verify_status(&self, report: &VerifyReport) -> AckStatus {
        match (self.config.ack_mode, report.outcome()) {
            (AckMode::Compatible, _) | (AckMode::Strict, VerifyOutcome::Match) => AckStatus::Ok,
            (AckMode::Strict, VerifyOutcome::ChecksumMismatch) => AckStatus::ChecksumMismatch,
            (AckMode::Strict, VerifyOutcome::LengthMismatch) => AckStatus::LengthMismatch,
        }
    }

    fn log_verify(&self, report: &VerifyReport) {
        match report.outcome() {
            VerifyOutcome::Match => log::info!(
                "verify ok: {} bytes, CRC32 0x{:08x}",
                report.received_bytes,
                report.computed_crc
            ),
            VerifyOutcome::ChecksumMismatch => log::warn!(
                "CRC mismatch: expected 0x{:08x}, got 0x{:08x}",
                report.expected_crc,
                report.computed_crc
            ),
            VerifyOutcome::LengthMismatch => log::warn!(
                "length mismatch: announced {} bytes, received {}",
                report.expected_length,
                report.received_bytes
            ),
        }
    }
}

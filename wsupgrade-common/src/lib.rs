// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Control-point protocol engine and shared types for WS-Upgrade.
//!
//! This crate supports both `no_std` (embedded) and `std` (host) environments:
//! - Default: `no_std` mode, engine and wire types only
//! - `std` feature: Enables the serial link framing used by the host tools

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate alloc;

pub mod engine;
pub mod error;
pub mod protocol;
pub mod router;
pub mod session;

#[cfg(feature = "std")]
pub mod link;

// Re-export commonly used types
pub use engine::{Accepted, Engine, EngineConfig, Outcome, VerifyOutcome, VerifyReport};
pub use error::FrameError;
pub use protocol::{AckMode, AckStatus, ControlCommand, Opcode, UploadState};
pub use protocol::{APP_INFO, DEFAULT_MAX_DATA_FRAME_LEN, MAX_CONTROL_FRAME_LEN};
pub use router::{AckSink, FrameRouter};
pub use session::{Session, CRC32};

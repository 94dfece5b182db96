// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Frame rejection reasons.
//!
//! Every variant is recoverable: a rejected frame leaves the session exactly
//! as it was, and the caller only logs the error.

use thiserror::Error;

use crate::protocol::UploadState;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Zero-length write; dropped by the router before the engine sees it.
    #[error("empty frame")]
    EmptyFrame,

    #[error("unexpected data length: {actual} (expected {expected})")]
    MalformedLength { expected: usize, actual: usize },

    #[error("unexpected command: {actual} (expected {expected})")]
    UnexpectedOpcode { expected: u8, actual: u8 },

    #[error("unexpected data transfer in state {state:?}")]
    UnexpectedDataFrame { state: UploadState },

    #[error("data frame too long: {len} bytes (max {max})")]
    OversizedDataFrame { len: usize, max: usize },
}

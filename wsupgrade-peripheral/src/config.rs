// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Peripheral configuration: optional TOML file, then CLI overrides.
//!
//! ```toml
//! output = "received.bin"
//!
//! [engine]
//! max_data_frame_len = 20
//! ack_mode = "compatible"   # or "strict"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use wsupgrade_common::link::MAX_LINK_PAYLOAD;
use wsupgrade_common::{AckMode, EngineConfig};

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PeripheralConfig {
    pub engine: EngineConfig,
    /// Where verified images are persisted; `None` keeps them in memory only.
    pub output: Option<PathBuf>,
}

impl PeripheralConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Command-line flags win over the file.
    pub fn with_overrides(
        mut self,
        max_data_frame: Option<usize>,
        strict_ack: bool,
        output: Option<PathBuf>,
    ) -> Self {
        if let Some(max) = max_data_frame {
            self.engine.max_data_frame_len = max;
        }
        if strict_ack {
            self.engine.ack_mode = AckMode::Strict;
        }
        if output.is_some() {
            self.output = output;
        }
        self
    }

    /// Reject settings the serial link cannot carry.
    pub fn validate(self) -> Result<Self> {
        let max = self.engine.max_data_frame_len;
        if max == 0 {
            bail!("max_data_frame_len must be at least 1 byte");
        }
        if max > MAX_LINK_PAYLOAD {
            bail!(
                "max_data_frame_len {} exceeds the serial link limit of {} bytes",
                max,
                MAX_LINK_PAYLOAD
            );
        }
        Ok(self)
    }
}

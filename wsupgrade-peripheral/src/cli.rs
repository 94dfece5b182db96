// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::PeripheralConfig;
use crate::service::{self, Peripheral};
use crate::transport::SerialLink;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "wsupgrade-peripheral")]
#[command(about = "WS-Upgrade peripheral emulator over a serial link")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyUSB0)
    #[arg(short, long)]
    pub port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    pub baud: u32,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Largest accepted data frame in bytes (transport limit, at most 248)
    #[arg(long, value_name = "BYTES")]
    pub max_data_frame: Option<usize>,

    /// Report verify failures in the acknowledgement byte
    #[arg(long)]
    pub strict_ack: bool,

    /// Write each verified image to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Initialize env_logger; `RUST_LOG` still takes precedence per module.
pub fn init_logging(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PeripheralConfig::load(path)?,
        None => PeripheralConfig::default(),
    }
    .with_overrides(cli.max_data_frame, cli.strict_ack, cli.output)
    .validate()?;

    log::info!(
        "engine: max data frame {} bytes, ack mode {:?}",
        config.engine.max_data_frame_len,
        config.engine.ack_mode
    );
    if let Some(path) = &config.output {
        log::info!("verified images will be written to {}", path.display());
    }

    let mut link = SerialLink::open(&cli.port, cli.baud)?;
    let mut peripheral = Peripheral::new(&config);
    service::run(&mut link, &mut peripheral)
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wsupgrade_common::DEFAULT_MAX_DATA_FRAME_LEN;

use crate::commands;
use crate::transport::{Transport, DEFAULT_TIMEOUT_MS};

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "wsupgrade-upload")]
#[command(about = "Firmware upload tool for the WS-Upgrade control point")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyUSB0)
    #[arg(short, long)]
    pub port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    pub baud: u32,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Read the app-info characteristic
    Info,

    /// Upload a firmware image
    Upload {
        /// Firmware binary file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Bytes per data write (must not exceed the peripheral's limit, at most 248)
        #[arg(short, long, default_value_t = DEFAULT_MAX_DATA_FRAME_LEN)]
        chunk_size: usize,
    },
}

/// Initialize env_logger; `RUST_LOG` still takes precedence per module.
pub fn init_logging(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let mut transport = Transport::with_timeout(&cli.port, cli.baud, cli.timeout_ms)?;

    match cli.command {
        Commands::Info => commands::info(&mut transport),
        Commands::Upload { file, chunk_size } => {
            commands::upload(&mut transport, &file, chunk_size)
        }
    }
}

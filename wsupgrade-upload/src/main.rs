// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware upload tool for the WS-Upgrade control point.
//!
//! Usage:
//!   wsupgrade-upload --port /dev/ttyUSB0 info
//!   wsupgrade-upload --port /dev/ttyUSB0 upload firmware.bin

mod cli;
mod commands;
mod transport;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::init_logging(args.verbose);
    cli::run(args)
}

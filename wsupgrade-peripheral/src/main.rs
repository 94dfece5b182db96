// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! WS-Upgrade peripheral emulator.
//!
//! Serves the upgrade control point and data characteristic over a serial
//! link instead of a BLE radio.
//!
//! Usage:
//!   wsupgrade-peripheral --port /dev/ttyUSB0
//!   wsupgrade-peripheral --port /dev/ttyUSB0 --output received.bin --strict-ack

mod cli;
mod config;
mod service;
mod transport;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::init_logging(args.verbose);
    cli::run(args)
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations for upgrade operations.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use wsupgrade_common::link::{LinkFrame, MAX_LINK_PAYLOAD};
use wsupgrade_common::{AckStatus, ControlCommand, APP_INFO, CRC32};

use crate::transport::Transport;

/// Read and display the app-info characteristic.
pub fn info(transport: &mut Transport) -> Result<()> {
    let info = transport.read_app_info()?;

    println!("App info: {:02x?}", info);
    if info == APP_INFO {
        println!("  Matches the WS-Upgrade target signature.");
    } else {
        println!("  Unknown target signature.");
    }

    Ok(())
}

/// Upload a firmware image through PrepareDownload, Download, data, Verify.
pub fn upload(transport: &mut Transport, file: &Path, chunk_size: usize) -> Result<()> {
    check_chunk_size(chunk_size)?;

    let firmware = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let size = image_length(&firmware)?;
    let crc32 = CRC32.checksum(&firmware);

    println!(
        "Firmware: {} ({} bytes, CRC32: 0x{:08x})",
        file.display(),
        size,
        crc32
    );
    println!("Chunk:    {} bytes per write", chunk_size);
    println!();

    transport.send(&LinkFrame::Subscribe)?;

    print!("Preparing download... ");
    std::io::stdout().flush()?;
    let status = transport.control(&ControlCommand::PrepareDownload.encode())?;
    check_ack("PrepareDownload", status)?;
    println!("OK");

    print!("Announcing image length... ");
    std::io::stdout().flush()?;
    let status = transport.control(&ControlCommand::Download { total_length: size }.encode())?;
    check_ack("Download", status)?;
    println!("OK");

    let pb = ProgressBar::new(size as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut sent = 0u64;
    for chunk in firmware.chunks(chunk_size) {
        if let Err(e) = transport.send(&LinkFrame::Data(chunk.to_vec())) {
            pb.abandon();
            return Err(e.context(format!("Data write failed at offset {}", sent)));
        }
        sent += chunk.len() as u64;
        pb.set_position(sent);
    }

    pb.finish_with_message("Transfer complete");
    println!();

    print!("Verifying... ");
    std::io::stdout().flush()?;
    let status = transport.control(&ControlCommand::Verify { crc32 }.encode())?;
    check_ack("Verify", status)?;
    println!("OK");

    println!();
    println!("Firmware uploaded successfully to {}!", transport.port_name());

    Ok(())
}

/// A data write must fit in one link frame.
fn check_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 {
        bail!("Chunk size must be at least 1 byte");
    }
    if chunk_size > MAX_LINK_PAYLOAD {
        bail!(
            "Chunk size {} exceeds the serial link limit of {} bytes",
            chunk_size,
            MAX_LINK_PAYLOAD
        );
    }
    Ok(())
}

/// The Download field is a u32.
fn image_length(firmware: &[u8]) -> Result<u32> {
    u32::try_from(firmware.len())
        .with_context(|| format!("Image too large: {} bytes", firmware.len()))
}

/// Interpret a control-point notification.
fn check_ack(step: &str, status: u8) -> Result<()> {
    match AckStatus::from_byte(status) {
        Some(AckStatus::Ok) => Ok(()),
        Some(AckStatus::ChecksumMismatch) => bail!("{}: CRC verification failed!", step),
        Some(AckStatus::LengthMismatch) => {
            bail!("{}: peripheral received a different number of bytes", step)
        }
        None => bail!("{} failed: unknown status 0x{:02x}", step, status),
    }
}

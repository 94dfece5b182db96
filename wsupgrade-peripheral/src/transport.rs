// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial link standing in for the GATT server.

use std::io::{Read, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serialport::SerialPort;

use wsupgrade_common::link::{FrameAccumulator, LinkFrame};

/// Read timeout; keeps the service loop responsive while idle.
const POLL_TIMEOUT_MS: u64 = 50;

pub struct SerialLink {
    port: Box<dyn SerialPort>,
    rx: FrameAccumulator,
}

impl SerialLink {
    /// Open the serial port backing the emulated peripheral.
    pub fn open(port_name: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(POLL_TIMEOUT_MS))
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;

        Ok(Self {
            port,
            rx: FrameAccumulator::new(),
        })
    }

    pub fn port_name(&self) -> String {
        self.port.name().unwrap_or_else(|| "?".to_string())
    }

    /// Read whatever is available and return the frames it completed.
    ///
    /// Undecodable frames are logged and dropped.
    pub fn poll(&mut self) -> Result<Vec<LinkFrame>> {
        let mut buf = [0u8; 256];
        let count = match self.port.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(Vec::new()),
            Err(e) => bail!("Serial read error: {}", e),
        };

        let mut frames = Vec::new();
        for &byte in &buf[..count] {
            match self.rx.push(byte) {
                Some(Ok(frame)) => frames.push(frame),
                Some(Err(e)) => log::warn!("dropping link frame: {}", e),
                None => {}
            }
        }
        Ok(frames)
    }

    pub fn send(&mut self, frame: &LinkFrame) -> Result<()> {
        let encoded = frame.to_vec()?;
        self.port
            .write_all(&encoded)
            .context("Failed to write to serial port")?;
        self.port.flush()?;
        Ok(())
    }
}

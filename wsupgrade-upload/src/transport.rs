// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport layer for talking to the upgrade peripheral.

use anyhow::{bail, Context, Result};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use wsupgrade_common::link::{FrameAccumulator, LinkFrame};

/// Default timeout for serial operations in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Serial link to the peripheral, one `LinkFrame` per GATT operation.
pub struct Transport {
    port: Box<dyn SerialPort>,
    rx: FrameAccumulator,
    timeout: Duration,
}

impl Transport {
    /// Open a serial link with a custom response timeout.
    pub fn with_timeout(port_name: &str, baud: u32, timeout_ms: u64) -> Result<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(50))
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;

        Ok(Self {
            port,
            rx: FrameAccumulator::new(),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Get the port name.
    pub fn port_name(&self) -> String {
        self.port.name().unwrap_or_else(|| "?".to_string())
    }

    /// Send one frame without waiting for anything back.
    pub fn send(&mut self, frame: &LinkFrame) -> Result<()> {
        let encoded = frame.to_vec()?;
        self.port
            .write_all(&encoded)
            .map_err(|e| anyhow::anyhow!("Failed to write to serial port: {}", e))?;
        self.port.flush()?;
        Ok(())
    }

    /// Wait for the next frame from the peripheral.
    pub fn receive(&mut self) -> Result<LinkFrame> {
        let deadline = Instant::now() + self.timeout;
        let mut byte = [0u8; 1];

        loop {
            if Instant::now() >= deadline {
                bail!("Timeout waiting for response");
            }
            match self.port.read(&mut byte) {
                Ok(1) => match self.rx.push(byte[0]) {
                    Some(Ok(frame)) => return Ok(frame),
                    Some(Err(e)) => log::warn!("dropping link frame: {}", e),
                    None => {}
                },
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => bail!("Serial read error: {}", e),
            }
        }
    }

    fn drain_rx(&mut self) {
        let mut buf = [0u8; 64];
        let old_timeout = self.port.timeout();
        let _ = self.port.set_timeout(Duration::from_millis(10));
        while self.port.read(&mut buf).unwrap_or(0) > 0 {}
        let _ = self.port.set_timeout(old_timeout);
        self.rx = FrameAccumulator::new();
    }

    /// Write to the control point and wait for its notification.
    pub fn control(&mut self, frame: &[u8]) -> Result<u8> {
        self.drain_rx();
        self.send(&LinkFrame::Control(frame.to_vec()))?;
        match self.receive()? {
            LinkFrame::Notify(status) => Ok(status),
            other => bail!("Unexpected response: {:?}", other),
        }
    }

    /// Read the app-info characteristic.
    pub fn read_app_info(&mut self) -> Result<[u8; 4]> {
        self.drain_rx();
        self.send(&LinkFrame::ReadAppInfo)?;
        match self.receive()? {
            LinkFrame::AppInfo(info) => Ok(info),
            other => bail!("Unexpected response: {:?}", other),
        }
    }
}

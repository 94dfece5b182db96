// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Peripheral service: link frames in, notifications out.
//!
//! Mirrors the GATT server of the upgrade target:
//! - Subscribe: a central subscribed, the session restarts from Idle
//! - Control / Data: writes routed into the protocol engine
//! - ReadAppInfo: answered with the static app-info blob
//!
//! Acks queued by the router are flushed as `Notify` frames after each write.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use wsupgrade_common::link::LinkFrame;
use wsupgrade_common::{Accepted, Engine, FrameRouter, VerifyReport, APP_INFO};

use crate::config::PeripheralConfig;
use crate::transport::SerialLink;

/// Cap on the up-front allocation for an announced image.
const MAX_PREALLOC: usize = 1024 * 1024;

/// Collects data frames of the current download.
///
/// Holds at most the announced length plus one data frame; the engine keeps
/// counting past that, so an overrun still fails Verify.
#[derive(Debug, Default)]
pub struct ImageAssembler {
    buf: Vec<u8>,
    limit: usize,
}

impl ImageAssembler {
    pub fn begin(&mut self, total_length: u32, frame_limit: usize) {
        self.buf.clear();
        self.limit = (total_length as usize).saturating_add(frame_limit);
        self.buf.reserve((total_length as usize).min(MAX_PREALLOC));
    }

    /// Append `data`, dropping whatever lies past the cap.
    pub fn extend(&mut self, data: &[u8]) {
        let room = self.limit.saturating_sub(self.buf.len());
        if data.len() > room {
            log::warn!(
                "image exceeds announced length, dropping {} bytes",
                data.len() - room
            );
        }
        self.buf.extend_from_slice(&data[..data.len().min(room)]);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.limit = 0;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

pub struct Peripheral {
    router: FrameRouter<Vec<u8>>,
    image: ImageAssembler,
    output: Option<PathBuf>,
}

impl Peripheral {
    pub fn new(config: &PeripheralConfig) -> Self {
        Self {
            router: FrameRouter::new(Engine::new(config.engine), Vec::new()),
            image: ImageAssembler::default(),
            output: config.output.clone(),
        }
    }

    /// Handle one link frame and return the frames to send back.
    pub fn handle(&mut self, frame: LinkFrame) -> Vec<LinkFrame> {
        let mut replies = Vec::new();

        match frame {
            LinkFrame::Subscribe => {
                log::info!("central subscribed");
                if !self.image.is_empty() {
                    log::debug!("dropping {} buffered image bytes", self.image.len());
                }
                self.router.on_subscribe();
                self.image.clear();
            }
            LinkFrame::Control(bytes) => {
                if let Ok(outcome) = self.router.deliver_control(&bytes) {
                    self.on_control(outcome.accepted);
                }
            }
            LinkFrame::Data(bytes) => {
                if self.router.deliver_data(&bytes).is_ok() {
                    self.image.extend(&bytes);
                }
            }
            LinkFrame::ReadAppInfo => replies.push(LinkFrame::AppInfo(APP_INFO)),
            other => log::warn!("ignoring unexpected link frame: {:?}", other),
        }

        replies.extend(self.router.sink_mut().drain(..).map(LinkFrame::Notify));
        replies
    }

    fn on_control(&mut self, accepted: Accepted) {
        match accepted {
            Accepted::DownloadStarted { total_length } => {
                let frame_limit = self.router.engine().config().max_data_frame_len;
                self.image.begin(total_length, frame_limit)
            }
            Accepted::Verified(report) => self.finish_image(&report),
            Accepted::Prepared | Accepted::DataReceived { .. } => {}
        }
    }

    fn finish_image(&mut self, report: &VerifyReport) {
        let image = self.image.take();
        if !report.is_success() {
            log::warn!(
                "discarding image ({} bytes): {:?}",
                image.len(),
                report.outcome()
            );
            return;
        }
        if let Some(path) = &self.output {
            match persist(path, &image) {
                Ok(()) => log::info!("wrote {} bytes to {}", image.len(), path.display()),
                Err(e) => log::error!("{:#}", e),
            }
        }
    }
}

fn persist(path: &Path, image: &[u8]) -> Result<()> {
    fs::write(path, image).with_context(|| format!("Failed to write {}", path.display()))
}

/// Serve the link forever.
pub fn run(link: &mut SerialLink, peripheral: &mut Peripheral) -> Result<()> {
    log::info!("WS-Upgrade peripheral listening on {}", link.port_name());

    loop {
        for frame in link.poll()? {
            for reply in peripheral.handle(frame) {
                link.send(&reply)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsupgrade_common::{AckMode, ControlCommand, EngineConfig, CRC32};

    fn control(cmd: ControlCommand) -> LinkFrame {
        LinkFrame::Control(cmd.encode().to_vec())
    }

    fn upload(peripheral: &mut Peripheral, image: &[u8], crc: u32) -> Vec<LinkFrame> {
        let mut replies = peripheral.handle(LinkFrame::Subscribe);
        replies.extend(peripheral.handle(control(ControlCommand::PrepareDownload)));
        replies.extend(peripheral.handle(control(ControlCommand::Download {
            total_length: image.len() as u32,
        })));
        for chunk in image.chunks(20) {
            replies.extend(peripheral.handle(LinkFrame::Data(chunk.to_vec())));
        }
        replies.extend(peripheral.handle(control(ControlCommand::Verify { crc32: crc })));
        replies
    }

    fn config_with_output(path: &Path) -> PeripheralConfig {
        PeripheralConfig {
            output: Some(path.to_path_buf()),
            ..PeripheralConfig::default()
        }
    }

    #[test]
    fn test_read_app_info() {
        let mut peripheral = Peripheral::new(&PeripheralConfig::default());
        assert_eq!(
            peripheral.handle(LinkFrame::ReadAppInfo),
            vec![LinkFrame::AppInfo([0xFF, 0xFF, 0x01, 0x00])]
        );
    }

    #[test]
    fn test_upload_notifies_three_acks() {
        let mut peripheral = Peripheral::new(&PeripheralConfig::default());
        let image: Vec<u8> = (0..100u8).collect();

        let replies = upload(&mut peripheral, &image, CRC32.checksum(&image));

        assert_eq!(replies, vec![LinkFrame::Notify(0x00); 3]);
    }

    #[test]
    fn test_verified_image_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        let mut peripheral = Peripheral::new(&config_with_output(&path));
        let image: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        upload(&mut peripheral, &image, CRC32.checksum(&image));

        assert_eq!(fs::read(&path).unwrap(), image);
    }

    #[test]
    fn test_corrupted_image_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        let mut peripheral = Peripheral::new(&config_with_output(&path));
        let image = vec![0x5Au8; 64];

        let replies = upload(&mut peripheral, &image, 0x1234_5678);

        assert_eq!(replies, vec![LinkFrame::Notify(0x00); 3]);
        assert!(!path.exists());
    }

    #[test]
    fn test_strict_mode_notifies_checksum_mismatch() {
        let config = PeripheralConfig {
            engine: EngineConfig {
                ack_mode: AckMode::Strict,
                ..EngineConfig::default()
            },
            output: None,
        };
        let mut peripheral = Peripheral::new(&config);

        let replies = upload(&mut peripheral, &[1, 2, 3], 0);

        assert_eq!(replies.last(), Some(&LinkFrame::Notify(0x01)));
    }

    #[test]
    fn test_rejected_writes_produce_no_reply() {
        let mut peripheral = Peripheral::new(&PeripheralConfig::default());

        assert!(peripheral.handle(LinkFrame::Data(vec![1, 2, 3])).is_empty());
        assert!(peripheral
            .handle(control(ControlCommand::Verify { crc32: 0 }))
            .is_empty());
        assert!(peripheral.handle(LinkFrame::Control(Vec::new())).is_empty());
        assert!(peripheral.handle(LinkFrame::Notify(0)).is_empty());
    }

    #[test]
    fn test_rejected_data_is_not_assembled() {
        let mut peripheral = Peripheral::new(&PeripheralConfig::default());
        peripheral.handle(control(ControlCommand::PrepareDownload));
        peripheral.handle(control(ControlCommand::Download { total_length: 4 }));

        peripheral.handle(LinkFrame::Data(vec![0u8; 21]));
        peripheral.handle(LinkFrame::Data(vec![1, 2, 3, 4]));

        assert_eq!(peripheral.image.len(), 4);
    }

    #[test]
    fn test_subscribe_drops_partial_image() {
        let mut peripheral = Peripheral::new(&PeripheralConfig::default());
        peripheral.handle(control(ControlCommand::PrepareDownload));
        peripheral.handle(control(ControlCommand::Download { total_length: 8 }));
        peripheral.handle(LinkFrame::Data(vec![7u8; 8]));

        peripheral.handle(LinkFrame::Subscribe);

        assert_eq!(peripheral.image.len(), 0);
    }

    #[test]
    fn test_image_assembler_begin_resets() {
        let mut image = ImageAssembler::default();
        image.begin(3, 20);
        image.extend(&[1, 2, 3]);
        image.begin(10, 20);
        image.extend(&[4]);
        assert_eq!(image.take(), vec![4]);
        assert_eq!(image.len(), 0);
    }

    #[test]
    fn test_image_assembler_caps_at_announced_length_plus_one_frame() {
        let mut image = ImageAssembler::default();
        image.begin(8, 4);

        image.extend(&[1; 6]);
        image.extend(&[2; 6]);
        image.extend(&[3; 6]);

        assert_eq!(image.len(), 12);
        assert_eq!(&image.take()[6..], &[2; 6]);
    }

    #[test]
    fn test_image_assembler_holds_nothing_before_begin() {
        let mut image = ImageAssembler::default();
        image.extend(&[1, 2, 3]);
        assert!(image.is_empty());
    }

    #[test]
    fn test_overrunning_upload_stays_bounded() {
        let mut peripheral = Peripheral::new(&PeripheralConfig::default());
        peripheral.handle(control(ControlCommand::PrepareDownload));
        peripheral.handle(control(ControlCommand::Download { total_length: 10 }));

        for _ in 0..100 {
            peripheral.handle(LinkFrame::Data(vec![0xEE; 20]));
        }

        assert_eq!(peripheral.image.len(), 30);
    }
}

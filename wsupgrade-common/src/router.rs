// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Frame router: one connection's session plus its outbound ack channel.

use crate::engine::{Engine, Outcome};
use crate::error::FrameError;
use crate::session::Session;

/// Outbound acknowledgement channel (control-point notifications).
///
/// Fan-out to every subscribed central is the transport's job.
pub trait AckSink {
    fn send_ack(&mut self, byte: u8);
}

#[cfg(feature = "std")]
impl AckSink for alloc::vec::Vec<u8> {
    fn send_ack(&mut self, byte: u8) {
        self.push(byte);
    }
}

impl<const N: usize> AckSink for heapless::Vec<u8, N> {
    fn send_ack(&mut self, byte: u8) {
        if self.push(byte).is_err() {
            log::warn!("ack queue full, dropping 0x{:02x}", byte);
        }
    }
}

/// Routes control and data frames of a single connection into the engine.
pub struct FrameRouter<S: AckSink> {
    engine: Engine,
    session: Session,
    sink: S,
}

impl<S: AckSink> FrameRouter<S> {
    pub fn new(engine: Engine, sink: S) -> Self {
        Self {
            engine,
            session: Session::new(),
            sink,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Deliver one control-point write.
    pub fn deliver_control(&mut self, frame: &[u8]) -> Result<Outcome, FrameError> {
        if frame.is_empty() {
            return self.reject(FrameError::EmptyFrame);
        }
        let result = self.engine.process_control(&mut self.session, frame);
        self.dispatch(result)
    }

    /// Deliver one data-characteristic write.
    pub fn deliver_data(&mut self, frame: &[u8]) -> Result<Outcome, FrameError> {
        if frame.is_empty() {
            return self.reject(FrameError::EmptyFrame);
        }
        let result = self.engine.process_data(&mut self.session, frame);
        self.dispatch(result)
    }

    /// A central subscribed to the control point.
    pub fn on_subscribe(&mut self) {
        self.engine.on_subscribe(&mut self.session);
    }

    fn dispatch(&mut self, result: Result<Outcome, FrameError>) -> Result<Outcome, FrameError> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => return self.reject(err),
        };
        if let Some(status) = outcome.ack {
            self.sink.send_ack(status.byte());
        }
        Ok(outcome)
    }

    fn reject(&self, err: FrameError) -> Result<Outcome, FrameError> {
        log::warn!("{:?}: {}", self.session.state(), err);
        Err(err)
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Live transport over a duplex byte stream.
//!
//! Every read from the device is logged as one inbound record before it is
//! decoded, and every command is logged as one outbound record before it
//! is sent. The record offset returned by the writer is the session time
//! of the frames completed by that read.

use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;

use tracing::debug;

use crate::config::ResyncPolicy;
use crate::core::SessionTime;
use crate::io::constants::stream;
use crate::io::writer::LogWriter;
use crate::protocol::frame::{encode, FrameBuffer, TimedFrame};
use crate::transport::Transport;
use crate::{PyroError, Result};

/// Bytes requested from the device per read.
const READ_CHUNK: usize = 4096;

/// Transport bound to a real device stream.
pub struct LiveTransport<S> {
    stream: S,
    writer: Arc<LogWriter>,
    buffer: FrameBuffer,
    read_buf: Vec<u8>,
    last_time: SessionTime,
}

impl<S: Read + Write> LiveTransport<S> {
    /// Drive `stream`, recording into `writer`.
    pub fn new(stream: S, writer: Arc<LogWriter>) -> Self {
        Self::with_policy(stream, writer, ResyncPolicy::default())
    }

    /// Drive `stream` with an explicit desync policy.
    pub fn with_policy(stream: S, writer: Arc<LogWriter>, policy: ResyncPolicy) -> Self {
        Self {
            stream,
            writer,
            buffer: FrameBuffer::with_policy(policy),
            read_buf: vec![0u8; READ_CHUNK],
            last_time: SessionTime::ZERO,
        }
    }

    /// The log writer shared with other producers.
    pub fn writer(&self) -> &Arc<LogWriter> {
        &self.writer
    }

    /// Give back the device stream, e.g. to shut it down.
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn fill(&mut self) -> Result<()> {
        let n = loop {
            match self.stream.read(&mut self.read_buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            debug!(context = "LiveTransport::get", "Device stream closed");
            return Err(PyroError::StreamClosed);
        }
        let chunk = &self.read_buf[..n];
        self.last_time = self.writer.write(stream::INBOUND, chunk)?;
        self.buffer.extend(chunk);
        Ok(())
    }
}

impl<S: Read + Write> Transport for LiveTransport<S> {
    fn get(&mut self) -> Result<TimedFrame> {
        loop {
            if let Some(frame) = self.buffer.next_frame()? {
                return Ok(TimedFrame {
                    time: self.last_time,
                    frame,
                });
            }
            self.fill()?;
        }
    }

    fn put(&mut self, msg_type: u8, payload: &[u8]) -> Result<()> {
        let frame = encode(msg_type, payload);
        self.writer.write(stream::OUTBOUND, &frame)?;
        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        Ok(())
    }

    fn annot(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write(stream::INFO, data)?;
        Ok(())
    }
}

impl<S> std::fmt::Debug for LiveTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveTransport")
            .field("buffered", &self.buffer.len())
            .field("last_time", &self.last_time)
            .finish_non_exhaustive()
    }
}

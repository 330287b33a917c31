// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Frames recovered from the inbound stream of a log.
//!
//! Inbound records hold whatever the device socket delivered in one read,
//! so a record may carry part of a frame or several frames. [`FrameStream`]
//! feeds the records through a [`FrameBuffer`] and stamps each frame with
//! the offset of the record that completed it.

use std::io::Read;

use tracing::warn;

use crate::config::ResyncPolicy;
use crate::core::SessionTime;
use crate::io::constants::stream;
use crate::io::reader::LogReader;
use crate::protocol::frame::{FrameBuffer, TimedFrame};
use crate::Result;

/// Device frames re-assembled from one stream of a log.
#[derive(Debug)]
pub struct FrameStream<R> {
    reader: LogReader<R>,
    buffer: FrameBuffer,
    stream_id: u16,
    last_time: SessionTime,
    frames: u64,
    failed: bool,
}

impl<R: Read> FrameStream<R> {
    /// Frames of the inbound stream.
    pub fn inbound(reader: LogReader<R>, policy: ResyncPolicy) -> Self {
        Self::new(reader, stream::INBOUND, policy)
    }

    /// Frames of any stream carrying raw device bytes.
    pub fn new(reader: LogReader<R>, stream_id: u16, policy: ResyncPolicy) -> Self {
        Self {
            reader,
            buffer: FrameBuffer::with_policy(policy),
            stream_id,
            last_time: SessionTime::ZERO,
            frames: 0,
            failed: false,
        }
    }

    /// Next complete frame.
    ///
    /// Fails with `EndOfLog` (or `Truncated`) once the stream is exhausted.
    pub fn next_frame(&mut self) -> Result<TimedFrame> {
        loop {
            if let Some(frame) = self.buffer.next_frame()? {
                self.frames += 1;
                return Ok(TimedFrame {
                    time: self.last_time,
                    frame,
                });
            }

            match self.reader.read(Some(self.stream_id)) {
                Ok(record) => {
                    self.last_time = record.offset;
                    self.buffer.extend(&record.payload);
                }
                Err(e) => {
                    if e.is_end_of_log() && !self.buffer.is_empty() {
                        warn!(
                            context = "FrameStream::next_frame",
                            leftover = self.buffer.len(),
                            "Log ends inside a frame"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Frames returned so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Bytes dropped while resynchronizing.
    pub fn skipped_bytes(&self) -> u64 {
        self.buffer.skipped_bytes()
    }

    /// Bytes buffered but not yet part of a returned frame.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// The underlying reader.
    pub fn reader(&self) -> &LogReader<R> {
        &self.reader
    }
}

impl<R: Read> Iterator for FrameStream<R> {
    type Item = Result<TimedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(e) => {
                // A fatal desync would repeat forever on the same bytes.
                self.failed = true;
                (!e.is_end_of_log()).then_some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ManualClock, SessionStart};
    use crate::io::writer::LogWriter;
    use crate::protocol::frame::encode;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_frames_span_records() {
        let buf = SharedBuf::default();
        let clock = ManualClock::new();
        let start = SessionStart::from_parts(2017, 6, 15, 10, 0, 0, 0).unwrap();
        let writer = LogWriter::with_clock(buf.clone(), start, clock.clone()).unwrap();

        let mut bytes = encode(0x06, &[0, 0, 0, 0]);
        bytes.extend(encode(0x0A, &[0; 6]));
        let (first, second) = bytes.split_at(25);

        clock.set(Duration::from_millis(1));
        writer.write(stream::INBOUND, first).unwrap();
        writer.write(stream::OUTBOUND, &encode(0x01, &[0, 0])).unwrap();
        clock.set(Duration::from_millis(2));
        writer.write(stream::INBOUND, second).unwrap();

        let data = buf.0.lock().unwrap().clone();
        let reader = LogReader::from_reader(data.as_slice()).unwrap();
        let mut frames = FrameStream::inbound(reader, ResyncPolicy::Fatal);

        let odo = frames.next_frame().unwrap();
        assert_eq!(odo.msg_type(), 0x06);
        assert_eq!(odo.time.as_micros(), 1000);

        let gyro = frames.next_frame().unwrap();
        assert_eq!(gyro.msg_type(), 0x0A);
        assert_eq!(gyro.time.as_micros(), 2000);

        assert!(frames.next().is_none());
        assert_eq!(frames.frame_count(), 2);
    }
}

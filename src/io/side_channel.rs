// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Side-channel capture.
//!
//! A capture runs on its own thread, pulls raw chunks from a
//! [`ChunkSource`], compresses each one with zstd and appends it to the
//! side-channel stream of a shared [`LogWriter`]. The only coordination
//! with the control loop is the writer's lock.
//!
//! A capture ends when its source is exhausted or after [`CaptureHandle::stop`]
//! once the current chunk is done. A source blocked in a read only notices
//! the stop request when it returns, so closing the source is the reliable
//! way to end a capture. Always join the handle before finishing the writer.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use crate::config::SideChannelConfig;
use crate::io::constants::{stream, MAX_SIDE_CHUNK_LEN};
use crate::io::writer::LogWriter;
use crate::{PyroError, Result};

/// Producer of raw side-channel bytes.
pub trait ChunkSource: Send {
    /// Next chunk, or `None` once the source is exhausted.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Chunk source over any byte reader.
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
    chunk_size: usize,
}

impl<R: Read> ReadSource<R> {
    /// Read chunks of at most `chunk_size` bytes from `inner`.
    pub fn new(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Recover the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> ChunkSource for ReadSource<R> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(buf));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl ChunkSource for Receiver<Vec<u8>> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        // Disconnection is the end of the source.
        Ok(self.recv().ok())
    }
}

/// Totals reported by a finished capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Records written to the side-channel stream
    pub records: u64,
    /// Raw bytes pulled from the source
    pub raw_bytes: u64,
    /// Compressed bytes written to the log
    pub compressed_bytes: u64,
}

/// Spawner for side-channel capture threads.
pub struct SideChannelCapture;

impl SideChannelCapture {
    /// Start capturing `source` into the side-channel stream of `writer`.
    pub fn spawn<S>(
        writer: Arc<LogWriter>,
        source: S,
        config: &SideChannelConfig,
    ) -> Result<CaptureHandle>
    where
        S: ChunkSource + 'static,
    {
        // Compressed pieces must still fit one record.
        let chunk_size = config.chunk_size.clamp(1, MAX_SIDE_CHUNK_LEN);
        if chunk_size != config.chunk_size {
            warn!(
                context = "SideChannelCapture::spawn",
                requested = config.chunk_size,
                chunk_size,
                "Clamped side-channel chunk size"
            );
        }

        let stop = Arc::new(AtomicBool::new(false));
        let worker = CaptureWorker {
            writer,
            chunk_size,
            level: config.compression_level,
            stop: Arc::clone(&stop),
        };

        let thread = thread::Builder::new()
            .name("side-channel".to_string())
            .spawn(move || worker.run(source))?;

        Ok(CaptureHandle {
            stop,
            thread: Some(thread),
        })
    }
}

struct CaptureWorker {
    writer: Arc<LogWriter>,
    chunk_size: usize,
    level: i32,
    stop: Arc<AtomicBool>,
}

impl CaptureWorker {
    fn run<S: ChunkSource>(self, mut source: S) -> Result<CaptureStats> {
        let mut stats = CaptureStats::default();

        while !self.stop.load(Ordering::Acquire) {
            let chunk = match source.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    warn!(context = "side-channel", error = %e, "Source failed");
                    return Err(e);
                }
            };
            for piece in chunk.chunks(self.chunk_size) {
                let compressed = zstd::bulk::compress(piece, self.level)
                    .map_err(|e| PyroError::compression("zstd", e.to_string()))?;
                self.writer.write(stream::SIDE_CHANNEL, &compressed)?;

                stats.records += 1;
                stats.raw_bytes += piece.len() as u64;
                stats.compressed_bytes += compressed.len() as u64;
            }
        }

        debug!(
            context = "side-channel",
            records = stats.records,
            raw_bytes = stats.raw_bytes,
            compressed_bytes = stats.compressed_bytes,
            "Capture finished"
        );
        Ok(stats)
    }
}

/// Handle on a running capture thread.
#[derive(Debug)]
pub struct CaptureHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<CaptureStats>>>,
}

impl CaptureHandle {
    /// Ask the capture to exit after the current chunk.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// True once the capture thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the capture thread and return its totals or first error.
    pub fn join(mut self) -> Result<CaptureStats> {
        let thread = self
            .thread
            .take()
            .ok_or_else(|| PyroError::worker("side-channel", "already joined"))?;
        thread
            .join()
            .map_err(|_| PyroError::worker("side-channel", "capture thread panicked"))?
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
        }
    }
}

/// Restore the raw bytes of one side-channel record.
pub fn decompress_side_payload(payload: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(payload).map_err(|e| PyroError::compression("zstd", e.to_string()))
}

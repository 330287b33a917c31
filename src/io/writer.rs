// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Append-only log writer.
//!
//! # Layout
//!
//! ```text
//! "Pyr" VERSION(u8)
//! START_TIME: year u16, month, day, hour, minute, second, pad, microsecond u32
//! { OFFSET_US u32 | STREAM_ID u16 | LENGTH u16 | PAYLOAD } *
//! ```
//!
//! All integers are little-endian. The writer is shared between threads
//! through `Arc<LogWriter>`: each `write` takes the internal lock, samples
//! the session clock and appends one whole record before releasing it.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pyrolog::io::{constants::stream, LogWriter};
//!
//! let writer = LogWriter::create_in("logs", "naio", "1st test")?;
//! let time = writer.write(stream::INFO, b"START")?;
//! println!("{} written at {time}", writer.path().unwrap().display());
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::core::{MonotonicClock, SessionClock, SessionStart, SessionTime};
use crate::io::constants::{
    stream, FILE_HEADER_LEN, FORMAT_VERSION, LOG_MAGIC, MAX_PAYLOAD_LEN, RECORD_HEADER_LEN,
};
use crate::io::record::RecordHeader;
use crate::{PyroError, Result};

/// Mutable state guarded by the writer lock.
struct WriterState {
    out: Box<dyn Write + Send>,
    /// Second handle on the log file, used only to sync it
    sync_handle: Option<File>,
    records: u64,
    bytes: u64,
    last_offset: SessionTime,
}

/// Thread-safe writer for the log container.
pub struct LogWriter {
    state: Mutex<WriterState>,
    clock: Box<dyn SessionClock>,
    start: SessionStart,
    path: Option<PathBuf>,
}

impl LogWriter {
    /// Create a log at `path`, starting the session now.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_at(path.as_ref(), SessionStart::now())
    }

    fn create_at(path: &Path, start: SessionStart) -> Result<Self> {
        let file = File::create(path)?;
        let sync_handle = file.try_clone().ok();
        let mut writer =
            Self::with_clock(BufWriter::new(file), start, MonotonicClock::start())?;
        writer.path = Some(path.to_path_buf());
        writer.lock().sync_handle = sync_handle;

        debug!(
            context = "LogWriter::create",
            path = %path.display(),
            start = %writer.start,
            "Created log"
        );
        Ok(writer)
    }

    /// Create a log named `<prefix>YYMMDD_HHMMSS.log` inside `dir`.
    ///
    /// A non-empty `note` is stored as the first info record.
    pub fn create_in<P: AsRef<Path>>(dir: P, prefix: &str, note: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let start = SessionStart::now();
        let writer = Self::create_at(&dir.join(start.file_name(prefix)), start)?;
        if !note.is_empty() {
            writer.write(stream::INFO, note.as_bytes())?;
        }
        Ok(writer)
    }

    /// Write a log into any byte sink, starting the session now.
    pub fn from_writer<W: Write + Send + 'static>(out: W) -> Result<Self> {
        Self::with_clock(out, SessionStart::now(), MonotonicClock::start())
    }

    /// Write a log with an explicit start time and session clock.
    pub fn with_clock<W, C>(out: W, start: SessionStart, clock: C) -> Result<Self>
    where
        W: Write + Send + 'static,
        C: SessionClock + 'static,
    {
        let mut out: Box<dyn Write + Send> = Box::new(out);
        write_file_header(&mut out, &start)?;
        out.flush()?;

        Ok(Self {
            state: Mutex::new(WriterState {
                out,
                sync_handle: None,
                records: 0,
                bytes: FILE_HEADER_LEN as u64,
                last_offset: SessionTime::ZERO,
            }),
            clock: Box::new(clock),
            start,
            path: None,
        })
    }

    /// Append one record and return its session offset.
    ///
    /// The clock is sampled while holding the lock, so offsets never
    /// decrease in file order even with several writing threads. The record
    /// is flushed before returning.
    pub fn write(&self, stream_id: u16, payload: &[u8]) -> Result<SessionTime> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(PyroError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        let mut state = self.lock();
        let offset = SessionTime::from_elapsed(self.clock.elapsed())?.max(state.last_offset);

        let header = RecordHeader {
            offset_us: offset.as_micros(),
            stream_id,
            length: payload.len() as u16,
        };
        let mut record = Vec::with_capacity(RECORD_HEADER_LEN + payload.len());
        header.write_to(&mut record)?;
        record.extend_from_slice(payload);

        state.out.write_all(&record)?;
        state.out.flush()?;
        state.records += 1;
        state.bytes += record.len() as u64;
        state.last_offset = offset;
        Ok(offset)
    }

    /// Wall-clock start of the session.
    pub fn start_time(&self) -> SessionStart {
        self.start
    }

    /// Path of the log file, if the writer owns one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records written so far.
    pub fn record_count(&self) -> u64 {
        self.lock().records
    }

    /// Bytes written so far, header included.
    pub fn bytes_written(&self) -> u64 {
        self.lock().bytes
    }

    /// Offset of the latest record.
    pub fn last_offset(&self) -> SessionTime {
        self.lock().last_offset
    }

    /// Flush buffered bytes and sync the file to disk.
    ///
    /// Side-channel captures must be joined before calling this.
    pub fn finish(&self) -> Result<()> {
        let mut state = self.lock();
        state.out.flush()?;
        if let Some(file) = &state.sync_handle {
            file.sync_all()?;
        }
        debug!(
            context = "LogWriter::finish",
            records = state.records,
            bytes = state.bytes,
            "Finished log"
        );
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        // A panic while holding the lock cannot leave a half-written record:
        // the record is assembled before the single write_all call.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("start", &self.start)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn write_file_header<W: Write>(out: &mut W, start: &SessionStart) -> Result<()> {
    out.write_all(&LOG_MAGIC)?;
    out.write_u8(FORMAT_VERSION)?;
    out.write_u16::<LittleEndian>(start.year())?;
    out.write_u8(start.month())?;
    out.write_u8(start.day())?;
    out.write_u8(start.hour())?;
    out.write_u8(start.minute())?;
    out.write_u8(start.second())?;
    out.write_u8(0)?;
    out.write_u32::<LittleEndian>(start.microsecond())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    /// Byte sink that can be inspected after the writer took ownership.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn start() -> SessionStart {
        SessionStart::from_parts(2017, 6, 15, 13, 45, 7, 123_456).unwrap()
    }

    #[test]
    fn test_header_bytes() {
        let buf = SharedBuf::default();
        let _writer = LogWriter::with_clock(buf.clone(), start(), ManualClock::new()).unwrap();

        let bytes = buf.0.lock().unwrap().clone();
        assert_eq!(bytes.len(), FILE_HEADER_LEN);
        assert_eq!(&bytes[..4], b"Pyr\0");
        assert_eq!(&bytes[4..6], &2017u16.to_le_bytes());
        assert_eq!(&bytes[6..12], &[6, 15, 13, 45, 7, 0]);
        assert_eq!(&bytes[12..16], &123_456u32.to_le_bytes());
    }

    #[test]
    fn test_record_bytes() {
        let buf = SharedBuf::default();
        let clock = ManualClock::new();
        let writer = LogWriter::with_clock(buf.clone(), start(), clock.clone()).unwrap();

        clock.set(Duration::from_micros(1500));
        let offset = writer.write(2, &[0xAA, 0xBB]).unwrap();
        assert_eq!(offset.as_micros(), 1500);
        assert_eq!(writer.record_count(), 1);

        let bytes = buf.0.lock().unwrap().clone();
        assert_eq!(
            &bytes[FILE_HEADER_LEN..],
            &[0xDC, 0x05, 0, 0, 2, 0, 2, 0, 0xAA, 0xBB]
        );
    }

    #[test]
    fn test_time_range_limit() {
        let clock = ManualClock::new();
        let writer = LogWriter::with_clock(Vec::new(), start(), clock.clone()).unwrap();

        clock.set(Duration::from_micros(SessionTime::LIMIT_US - 1));
        assert!(writer.write(0, b"ok").is_ok());

        clock.set(Duration::from_secs(3600));
        let err = writer.write(0, b"late").unwrap_err();
        assert!(matches!(err, PyroError::TimeRangeExceeded { .. }));
        assert_eq!(writer.record_count(), 1);
    }

    #[test]
    fn test_payload_limit() {
        let writer = LogWriter::with_clock(Vec::new(), start(), ManualClock::new()).unwrap();
        assert!(writer.write(1, &vec![0u8; MAX_PAYLOAD_LEN]).is_ok());

        let err = writer.write(1, &vec![0u8; MAX_PAYLOAD_LEN + 1]).unwrap_err();
        assert!(matches!(
            err,
            PyroError::PayloadTooLarge {
                len: 65536,
                max: 65535
            }
        ));
    }

    #[test]
    fn test_offsets_never_decrease() {
        let clock = ManualClock::new();
        let writer = LogWriter::with_clock(Vec::new(), start(), clock.clone()).unwrap();

        clock.set(Duration::from_millis(10));
        let first = writer.write(0, b"a").unwrap();
        clock.set(Duration::from_millis(5));
        let second = writer.write(0, b"b").unwrap();
        assert_eq!(first, second);
        assert_eq!(writer.last_offset(), first);
    }
}

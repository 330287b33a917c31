// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sequential log reader.
//!
//! Records are returned in file order. A stream filter skips records of
//! other streams transparently; callers that need several streams in
//! lockstep either read unfiltered or open one reader per stream.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::warn;

use crate::core::{SessionStart, SessionTime};
use crate::io::constants::{
    FILE_HEADER_LEN, FORMAT_VERSION, LOG_MAGIC, RECORD_HEADER_LEN,
};
use crate::io::filter::StreamFilter;
use crate::io::record::{LogRecord, RecordHeader};
use crate::{PyroError, Result};

/// Reader for the log container.
pub struct LogReader<R = BufReader<File>> {
    input: R,
    start: SessionStart,
    /// Byte position of the next record
    position: u64,
    path: Option<PathBuf>,
}

impl LogReader<BufReader<File>> {
    /// Open a log file and validate its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = Self::from_reader(BufReader::new(file))?;
        reader.path = Some(path.to_path_buf());
        Ok(reader)
    }
}

impl<R: Read> LogReader<R> {
    /// Read a log from any byte source and validate its header.
    pub fn from_reader(mut input: R) -> Result<Self> {
        let mut header = [0u8; FILE_HEADER_LEN];
        let got = read_full(&mut input, &mut header)?;
        if got < FILE_HEADER_LEN {
            return Err(PyroError::invalid_header(format!(
                "file holds {got} bytes, header needs {FILE_HEADER_LEN}"
            )));
        }
        let start = parse_file_header(&header)?;

        Ok(Self {
            input,
            start,
            position: FILE_HEADER_LEN as u64,
            path: None,
        })
    }

    /// Wall-clock start of the recorded session.
    pub fn start_time(&self) -> SessionStart {
        self.start
    }

    /// Path of the log file, if opened from one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Byte position of the next record.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next record, optionally only of one stream.
    ///
    /// Fails with `EndOfLog` when no bytes remain at a record boundary and
    /// with `Truncated` when the final record is incomplete.
    pub fn read(&mut self, stream_id: Option<u16>) -> Result<LogRecord> {
        match stream_id {
            Some(id) => self.read_filtered(&StreamFilter::Only(id)),
            None => self.next_record(),
        }
    }

    /// Read the next record accepted by `filter`.
    pub fn read_filtered(&mut self, filter: &StreamFilter) -> Result<LogRecord> {
        loop {
            let record = self.next_record()?;
            if filter.should_include(record.stream_id) {
                return Ok(record);
            }
        }
    }

    /// Iterate over the remaining records accepted by `filter`.
    ///
    /// Iteration ends at the end of the log. A truncated final record is
    /// reported with a warning and also ends iteration.
    pub fn records(&mut self, filter: StreamFilter) -> RecordIter<'_, R> {
        RecordIter {
            reader: self,
            filter,
            done: false,
        }
    }

    /// Consume the reader and tally every remaining record per stream.
    pub fn summary(mut self) -> Result<LogSummary> {
        let mut summary = LogSummary {
            start: self.start,
            records: 0,
            last_offset: SessionTime::ZERO,
            streams: BTreeMap::new(),
            truncated: false,
        };

        loop {
            match self.next_record() {
                Ok(record) => summary.add(&record),
                Err(PyroError::EndOfLog) => break,
                Err(e @ PyroError::Truncated { .. }) => {
                    warn!(context = "LogReader::summary", error = %e, "Log ends mid-record");
                    summary.truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    fn next_record(&mut self) -> Result<LogRecord> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        let got = read_full(&mut self.input, &mut header)?;
        if got == 0 {
            return Err(PyroError::EndOfLog);
        }
        if got < RECORD_HEADER_LEN {
            return Err(PyroError::truncated(self.position, RECORD_HEADER_LEN, got));
        }
        let header = RecordHeader::parse(&header);

        let mut payload = vec![0u8; header.length as usize];
        let got = read_full(&mut self.input, &mut payload)?;
        if got < payload.len() {
            return Err(PyroError::truncated(
                self.position,
                RECORD_HEADER_LEN + payload.len(),
                RECORD_HEADER_LEN + got,
            ));
        }

        self.position += (RECORD_HEADER_LEN + payload.len()) as u64;
        Ok(LogRecord::new(
            SessionTime::from_micros(header.offset_us),
            header.stream_id,
            payload,
        ))
    }
}

impl<R> std::fmt::Debug for LogReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogReader")
            .field("start", &self.start)
            .field("position", &self.position)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Iterator over filtered records of a [`LogReader`].
pub struct RecordIter<'a, R> {
    reader: &'a mut LogReader<R>,
    filter: StreamFilter,
    done: bool,
}

impl<R: Read> Iterator for RecordIter<'_, R> {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_filtered(&self.filter) {
            Ok(record) => Some(Ok(record)),
            Err(PyroError::EndOfLog) => {
                self.done = true;
                None
            }
            Err(e @ PyroError::Truncated { .. }) => {
                warn!(context = "RecordIter", error = %e, "Log ends mid-record");
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Per-stream totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Number of records
    pub records: u64,
    /// Total payload bytes
    pub bytes: u64,
    /// Offset of the first record
    pub first_offset: SessionTime,
    /// Offset of the last record
    pub last_offset: SessionTime,
}

/// Overview of a whole log.
#[derive(Debug, Clone)]
pub struct LogSummary {
    /// Session start
    pub start: SessionStart,
    /// Total records
    pub records: u64,
    /// Offset of the last record
    pub last_offset: SessionTime,
    /// Totals keyed by stream id
    pub streams: BTreeMap<u16, StreamStats>,
    /// True when the final record was cut short
    pub truncated: bool,
}

impl LogSummary {
    fn add(&mut self, record: &LogRecord) {
        self.records += 1;
        self.last_offset = record.offset;
        let stats = self
            .streams
            .entry(record.stream_id)
            .or_insert_with(|| StreamStats {
                first_offset: record.offset,
                ..StreamStats::default()
            });
        stats.records += 1;
        stats.bytes += record.payload.len() as u64;
        stats.last_offset = record.offset;
    }

    /// Totals for one stream.
    pub fn stream(&self, stream_id: u16) -> Option<&StreamStats> {
        self.streams.get(&stream_id)
    }
}

fn parse_file_header(header: &[u8; FILE_HEADER_LEN]) -> Result<SessionStart> {
    if header[..LOG_MAGIC.len()] != LOG_MAGIC {
        return Err(PyroError::invalid_header(format!(
            "bad magic {}",
            hex::encode(&header[..LOG_MAGIC.len()])
        )));
    }
    let version = header[LOG_MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(PyroError::UnsupportedVersion { version });
    }

    let mut time = &header[LOG_MAGIC.len() + 1..];
    let year = time.read_u16::<LittleEndian>()?;
    let month = time.read_u8()?;
    let day = time.read_u8()?;
    let hour = time.read_u8()?;
    let minute = time.read_u8()?;
    let second = time.read_u8()?;
    let _pad = time.read_u8()?;
    let microsecond = time.read_u32::<LittleEndian>()?;
    SessionStart::from_parts(year, month, day, hour, minute, second, microsecond)
}

/// Read until `buf` is full or the source is exhausted.
fn read_full<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        let mut bytes = b"Pyr\0".to_vec();
        bytes.extend_from_slice(&2017u16.to_le_bytes());
        bytes.extend_from_slice(&[6, 15, 13, 45, 7, 0]);
        bytes.extend_from_slice(&123_456u32.to_le_bytes());
        bytes
    }

    fn record_bytes(offset: u32, stream_id: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = offset.to_le_bytes().to_vec();
        bytes.extend_from_slice(&stream_id.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_parse_header() {
        let bytes = header_bytes();
        let reader = LogReader::from_reader(bytes.as_slice()).unwrap();
        let start = reader.start_time();
        assert_eq!(start.year(), 2017);
        assert_eq!(start.second(), 7);
        assert_eq!(start.microsecond(), 123_456);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = header_bytes();
        bytes[0] = b'X';
        let err = LogReader::from_reader(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, PyroError::InvalidHeader { .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = header_bytes();
        bytes[3] = 1;
        let err = LogReader::from_reader(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, PyroError::UnsupportedVersion { version: 1 }));
    }

    #[test]
    fn test_short_header() {
        let err = LogReader::from_reader(&b"Pyr"[..]).unwrap_err();
        assert!(matches!(err, PyroError::InvalidHeader { .. }));
    }

    #[test]
    fn test_filtered_read_keeps_order() {
        let mut bytes = header_bytes();
        bytes.extend(record_bytes(10, 1, b"in-a"));
        bytes.extend(record_bytes(20, 3, b"video"));
        bytes.extend(record_bytes(30, 2, b"out"));
        bytes.extend(record_bytes(40, 1, b"in-b"));

        let mut reader = LogReader::from_reader(bytes.as_slice()).unwrap();
        let first = reader.read(Some(1)).unwrap();
        assert_eq!(first.payload, b"in-a");
        let second = reader.read(Some(1)).unwrap();
        assert_eq!(second.payload, b"in-b");
        assert_eq!(second.offset.as_micros(), 40);
        assert!(matches!(reader.read(Some(1)), Err(PyroError::EndOfLog)));
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = header_bytes();
        bytes.extend(record_bytes(10, 1, b"whole"));
        let mut partial = record_bytes(20, 1, b"partial");
        partial.truncate(RECORD_HEADER_LEN + 3);
        bytes.extend(partial);

        let mut reader = LogReader::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(reader.read(None).unwrap().payload, b"whole");
        let err = reader.read(None).unwrap_err();
        assert!(matches!(
            err,
            PyroError::Truncated {
                position: 29,
                needed: 15,
                available: 11
            }
        ));
        assert!(err.is_end_of_log());
    }

    #[test]
    fn test_truncated_header() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&[1, 2, 3]);
        let mut reader = LogReader::from_reader(bytes.as_slice()).unwrap();
        let err = reader.read(None).unwrap_err();
        assert!(matches!(err, PyroError::Truncated { available: 3, .. }));
    }

    #[test]
    fn test_summary() {
        let mut bytes = header_bytes();
        bytes.extend(record_bytes(0, 0, b"note"));
        bytes.extend(record_bytes(10, 1, b"abc"));
        bytes.extend(record_bytes(25, 1, b"de"));
        bytes.extend_from_slice(&[9, 9]);

        let summary = LogReader::from_reader(bytes.as_slice())
            .unwrap()
            .summary()
            .unwrap();
        assert_eq!(summary.records, 3);
        assert!(summary.truncated);
        assert_eq!(summary.last_offset.as_micros(), 25);
        let inbound = summary.stream(1).unwrap();
        assert_eq!(inbound.records, 2);
        assert_eq!(inbound.bytes, 5);
        assert_eq!(inbound.first_offset.as_micros(), 10);
        assert!(summary.stream(2).is_none());
    }

    #[test]
    fn test_records_iterator() {
        let mut bytes = header_bytes();
        for i in 0..5u32 {
            bytes.extend(record_bytes(i, (i % 2) as u16, &[i as u8]));
        }
        let mut reader = LogReader::from_reader(bytes.as_slice()).unwrap();
        let payloads: Vec<u8> = reader
            .records(StreamFilter::Only(0))
            .map(|r| r.unwrap().payload[0])
            .collect();
        assert_eq!(payloads, vec![0, 2, 4]);
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Log records and stream ids.

use std::fmt;
use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};

use crate::core::SessionTime;
use crate::io::constants::{stream, RECORD_HEADER_LEN};
use crate::Result;

/// Logical stream multiplexed in one log.
///
/// Ids 0 to 3 are reserved, the rest are free for extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamId {
    /// Annotations and session notes
    Info,
    /// Bytes received from the device
    Inbound,
    /// Frames sent to the device
    Outbound,
    /// Compressed side-channel data
    SideChannel,
    /// Any other id
    User(u16),
}

impl StreamId {
    /// Raw id stored in the record header.
    pub fn id(self) -> u16 {
        match self {
            StreamId::Info => stream::INFO,
            StreamId::Inbound => stream::INBOUND,
            StreamId::Outbound => stream::OUTBOUND,
            StreamId::SideChannel => stream::SIDE_CHANNEL,
            StreamId::User(id) => id,
        }
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            StreamId::Info => "info",
            StreamId::Inbound => "inbound",
            StreamId::Outbound => "outbound",
            StreamId::SideChannel => "side-channel",
            StreamId::User(_) => "user",
        }
    }
}

impl From<u16> for StreamId {
    fn from(id: u16) -> Self {
        match id {
            stream::INFO => StreamId::Info,
            stream::INBOUND => StreamId::Inbound,
            stream::OUTBOUND => StreamId::Outbound,
            stream::SIDE_CHANNEL => StreamId::SideChannel,
            other => StreamId::User(other),
        }
    }
}

impl From<StreamId> for u16 {
    fn from(stream: StreamId) -> Self {
        stream.id()
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamId::User(id) => write!(f, "user({id})"),
            other => f.write_str(other.name()),
        }
    }
}

/// One entry of the log container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Time since session start when the record was written
    pub offset: SessionTime,
    /// Raw stream id
    pub stream_id: u16,
    /// Record bytes
    pub payload: Vec<u8>,
}

impl LogRecord {
    /// Create a new record.
    pub fn new(offset: SessionTime, stream_id: u16, payload: Vec<u8>) -> Self {
        Self {
            offset,
            stream_id,
            payload,
        }
    }

    /// Typed stream of the record.
    pub fn stream(&self) -> StreamId {
        StreamId::from(self.stream_id)
    }

    /// Size of the record on disk.
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_LEN + self.payload.len()
    }
}

/// Fixed 8-byte record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordHeader {
    pub offset_us: u32,
    pub stream_id: u16,
    pub length: u16,
}

impl RecordHeader {
    pub fn encode(&self) -> [u8; RECORD_HEADER_LEN] {
        let mut bytes = [0u8; RECORD_HEADER_LEN];
        LittleEndian::write_u32(&mut bytes[0..4], self.offset_us);
        LittleEndian::write_u16(&mut bytes[4..6], self.stream_id);
        LittleEndian::write_u16(&mut bytes[6..8], self.length);
        bytes
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.encode())?;
        Ok(())
    }

    pub fn parse(bytes: &[u8; RECORD_HEADER_LEN]) -> Self {
        Self {
            offset_us: LittleEndian::read_u32(&bytes[0..4]),
            stream_id: LittleEndian::read_u16(&bytes[4..6]),
            length: LittleEndian::read_u16(&bytes[6..8]),
        }
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Log container constants.
//!
//! Single source of truth for the on-disk layout shared by the writer and
//! the reader.

/// Magic prefix at the start of every log file.
pub const LOG_MAGIC: [u8; 3] = *b"Pyr";

/// Format version byte following the magic.
pub const FORMAT_VERSION: u8 = 0;

/// Size of the encoded session start time.
///
/// year u16, month, day, hour, minute, second (u8 each), one pad byte,
/// microsecond u32.
pub const START_TIME_LEN: usize = 12;

/// Total size of the file header (magic + version + start time).
pub const FILE_HEADER_LEN: usize = LOG_MAGIC.len() + 1 + START_TIME_LEN;

/// Size of a record header: offset u32, stream id u16, length u16.
pub const RECORD_HEADER_LEN: usize = 8;

/// Largest payload a record can hold.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Largest raw side-channel chunk compressed into one record.
///
/// zstd output for incompressible input stays well under twice this.
pub const MAX_SIDE_CHUNK_LEN: usize = 32 * 1024;

/// Reserved stream ids.
pub mod stream {
    /// Annotations and session notes.
    pub const INFO: u16 = 0;
    /// Bytes received from the device.
    pub const INBOUND: u16 = 1;
    /// Frames sent to the device.
    pub const OUTBOUND: u16 = 2;
    /// Compressed side-channel data (video).
    pub const SIDE_CHANNEL: u16 = 3;
}

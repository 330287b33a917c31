// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Log container I/O.
//!
//! This module provides the append-only multiplexed log: a session header
//! followed by timestamped records tagged with a stream id.

pub mod constants;
pub mod filter;
pub mod reader;
pub mod record;
pub mod side_channel;
pub mod writer;

// Re-exports
pub use filter::StreamFilter;
pub use reader::{LogReader, LogSummary, RecordIter, StreamStats};
pub use record::{LogRecord, StreamId};
pub use side_channel::{
    decompress_side_payload, CaptureHandle, CaptureStats, ChunkSource, ReadSource,
    SideChannelCapture,
};
pub use writer::LogWriter;

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for pyrolog.
//!
//! One error enum covers the whole record/replay substrate:
//! - Log container reading and writing
//! - Device frame decoding
//! - Transport replay verification
//! - Side-channel compression

use std::io;

use thiserror::Error;

/// Errors that can occur while recording, replaying or decoding a session.
#[derive(Debug, Error)]
pub enum PyroError {
    /// The reader is exhausted at a record boundary.
    ///
    /// This is the expected end of a bounded replay, not a failure.
    #[error("End of log")]
    EndOfLog,

    /// A record header or payload was cut short at the end of the file.
    #[error("Truncated record at byte {position}: needed {needed} bytes, only {available} available")]
    Truncated {
        /// File position of the incomplete record
        position: u64,
        /// Bytes the record needs
        needed: usize,
        /// Bytes actually present
        available: usize,
    },

    /// The file does not start with a valid container header.
    #[error("Invalid log header: {reason}")]
    InvalidHeader {
        /// What was wrong with the header
        reason: String,
    },

    /// The container was written by an unknown format version.
    #[error("Unsupported log format version {version}")]
    UnsupportedVersion {
        /// Version byte found in the header
        version: u8,
    },

    /// The session outlived the one-hour offset range.
    #[error("Session time {elapsed_us} us exceeds the one-hour log range")]
    TimeRangeExceeded {
        /// Elapsed microseconds at the failed write
        elapsed_us: u64,
    },

    /// A record payload does not fit the 16-bit length field.
    #[error("Payload of {len} bytes exceeds the record limit of {max} bytes")]
    PayloadTooLarge {
        /// Payload length that was rejected
        len: usize,
        /// Largest accepted payload length
        max: usize,
    },

    /// The frame tag was not found where a frame should start.
    #[error("Protocol desync: expected frame tag, found {found}")]
    ProtocolDesync {
        /// Hex dump of the bytes found instead of the tag
        found: String,
    },

    /// A known message type arrived with the wrong payload size.
    #[error("Message type {msg_type:#04x} payload is {actual} bytes, expected {expected}")]
    PayloadSizeMismatch {
        /// Message type id
        msg_type: u8,
        /// Payload size the decoder requires
        expected: usize,
        /// Payload size received
        actual: usize,
    },

    /// An outbound frame differs from the recorded reference.
    #[error("Replay divergence at {time_us} us: recorded {expected}, computed {actual}")]
    ReplayDivergence {
        /// Offset of the reference record
        time_us: u32,
        /// Hex dump of the recorded frame
        expected: String,
        /// Hex dump of the freshly encoded frame
        actual: String,
    },

    /// The live duplex stream reached end of file.
    #[error("Device stream closed")]
    StreamClosed,

    /// Side-channel compression or decompression failed.
    #[error("{codec} compression error: {message}")]
    Compression {
        /// Codec name
        codec: String,
        /// Error message
        message: String,
    },

    /// Invalid or unreadable configuration.
    #[error("Config error in {context}: {message}")]
    Config {
        /// Where the configuration came from
        context: String,
        /// Error message
        message: String,
    },

    /// A worker thread panicked or could not be joined.
    #[error("Worker '{name}' failed: {message}")]
    Worker {
        /// Worker name
        name: String,
        /// Error message
        message: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PyroError {
    /// Create a truncated record error.
    pub fn truncated(position: u64, needed: usize, available: usize) -> Self {
        PyroError::Truncated {
            position,
            needed,
            available,
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(reason: impl Into<String>) -> Self {
        PyroError::InvalidHeader {
            reason: reason.into(),
        }
    }

    /// Create a protocol desync error from the offending bytes.
    pub fn desync(found: &[u8]) -> Self {
        PyroError::ProtocolDesync {
            found: hex::encode(found),
        }
    }

    /// Create a payload size mismatch error.
    pub fn size_mismatch(msg_type: u8, expected: usize, actual: usize) -> Self {
        PyroError::PayloadSizeMismatch {
            msg_type,
            expected,
            actual,
        }
    }

    /// Create a replay divergence error from the two frames.
    pub fn divergence(time_us: u32, expected: &[u8], actual: &[u8]) -> Self {
        PyroError::ReplayDivergence {
            time_us,
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        }
    }

    /// Create a compression error.
    pub fn compression(codec: impl Into<String>, message: impl Into<String>) -> Self {
        PyroError::Compression {
            codec: codec.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(context: impl Into<String>, message: impl Into<String>) -> Self {
        PyroError::Config {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a worker error.
    pub fn worker(name: impl Into<String>, message: impl Into<String>) -> Self {
        PyroError::Worker {
            name: name.into(),
            message: message.into(),
        }
    }

    /// True for the errors that mark the end of a recording.
    ///
    /// A truncated tail counts: the last record of a killed session may be
    /// incomplete and replay stops there.
    pub fn is_end_of_log(&self) -> bool {
        matches!(self, PyroError::EndOfLog | PyroError::Truncated { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            PyroError::EndOfLog | PyroError::StreamClosed => vec![],
            PyroError::Truncated {
                position,
                needed,
                available,
            } => vec![
                ("position", position.to_string()),
                ("needed", needed.to_string()),
                ("available", available.to_string()),
            ],
            PyroError::InvalidHeader { reason } => vec![("reason", reason.clone())],
            PyroError::UnsupportedVersion { version } => vec![("version", version.to_string())],
            PyroError::TimeRangeExceeded { elapsed_us } => {
                vec![("elapsed_us", elapsed_us.to_string())]
            }
            PyroError::PayloadTooLarge { len, max } => {
                vec![("len", len.to_string()), ("max", max.to_string())]
            }
            PyroError::ProtocolDesync { found } => vec![("found", found.clone())],
            PyroError::PayloadSizeMismatch {
                msg_type,
                expected,
                actual,
            } => vec![
                ("msg_type", format!("{msg_type:#04x}")),
                ("expected", expected.to_string()),
                ("actual", actual.to_string()),
            ],
            PyroError::ReplayDivergence {
                time_us,
                expected,
                actual,
            } => vec![
                ("time_us", time_us.to_string()),
                ("expected", expected.clone()),
                ("actual", actual.clone()),
            ],
            PyroError::Compression { codec, message } => {
                vec![("codec", codec.clone()), ("message", message.clone())]
            }
            PyroError::Config { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            PyroError::Worker { name, message } => {
                vec![("name", name.clone()), ("message", message.clone())]
            }
            PyroError::Io(err) => vec![("message", err.to_string())],
        }
    }
}

/// Result type for pyrolog operations.
pub type Result<T> = std::result::Result<T, PyroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_log_display() {
        assert_eq!(PyroError::EndOfLog.to_string(), "End of log");
        assert!(PyroError::EndOfLog.is_end_of_log());
    }

    #[test]
    fn test_truncated_counts_as_end_of_log() {
        let err = PyroError::truncated(120, 8, 3);
        assert!(err.is_end_of_log());
        assert_eq!(
            err.to_string(),
            "Truncated record at byte 120: needed 8 bytes, only 3 available"
        );
    }

    #[test]
    fn test_desync_hex() {
        let err = PyroError::desync(b"NAIO02");
        assert!(matches!(err, PyroError::ProtocolDesync { .. }));
        assert_eq!(
            err.to_string(),
            "Protocol desync: expected frame tag, found 4e41494f3032"
        );
        assert!(!err.is_end_of_log());
    }

    #[test]
    fn test_size_mismatch_display() {
        let err = PyroError::size_mismatch(0x06, 4, 5);
        assert_eq!(
            err.to_string(),
            "Message type 0x06 payload is 5 bytes, expected 4"
        );
    }

    #[test]
    fn test_divergence_fields() {
        let err = PyroError::divergence(1500, &[0x70, 0x70], &[0x00, 0x00]);
        let fields = err.log_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], ("time_us", "1500".to_string()));
        assert_eq!(fields[1], ("expected", "7070".to_string()));
        assert_eq!(fields[2], ("actual", "0000".to_string()));
    }

    #[test]
    fn test_time_range_display() {
        let err = PyroError::TimeRangeExceeded {
            elapsed_us: 3_600_000_000,
        };
        assert_eq!(
            err.to_string(),
            "Session time 3600000000 us exceeds the one-hour log range"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: PyroError = io_err.into();
        assert!(matches!(err, PyroError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: file not found");
        assert_eq!(err.log_fields()[0].1, "file not found");
    }

    #[test]
    fn test_log_fields_config() {
        let err = PyroError::config("session.toml", "bad value");
        let fields = err.log_fields();
        assert_eq!(fields[0], ("context", "session.toml".to_string()));
        assert_eq!(fields[1], ("message", "bad value".to_string()));
    }
}

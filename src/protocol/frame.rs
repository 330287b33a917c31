// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Device frame codec.
//!
//! # Wire format
//!
//! ```text
//! "NAIO01" | TYPE u8 | LENGTH u32 BE | PAYLOAD | TRAILER[4]
//! ```
//!
//! The trailer is carried through decoding untouched and is never checked
//! against the payload. Encoded frames use a fixed filler trailer.

use byteorder::{BigEndian, ByteOrder};
use tracing::warn;

use crate::config::ResyncPolicy;
use crate::core::SessionTime;
use crate::{PyroError, Result};

/// Literal tag starting every frame.
pub const FRAME_TAG: [u8; 6] = *b"NAIO01";

/// Tag, type and length.
pub const FRAME_HEADER_LEN: usize = FRAME_TAG.len() + 1 + 4;

/// Size of the trailer after the payload.
pub const TRAILER_LEN: usize = 4;

/// Bytes a frame adds around its payload.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_LEN + TRAILER_LEN;

/// Trailer written by [`encode`].
pub const TRAILER_FILLER: [u8; TRAILER_LEN] = [0xCD; TRAILER_LEN];

/// One device protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFrame {
    /// Message type id
    pub msg_type: u8,
    /// Message payload
    pub payload: Vec<u8>,
    /// Trailer as received
    pub trailer: [u8; TRAILER_LEN],
}

impl DeviceFrame {
    /// Create a frame with the filler trailer.
    pub fn new(msg_type: u8, payload: Vec<u8>) -> Self {
        Self {
            msg_type,
            payload,
            trailer: TRAILER_FILLER,
        }
    }

    /// Size of the frame on the wire.
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Wire representation, keeping this frame's trailer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&FRAME_TAG);
        out.push(self.msg_type);
        let mut len = [0u8; 4];
        BigEndian::write_u32(&mut len, self.payload.len() as u32);
        out.extend_from_slice(&len);
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.trailer);
        out
    }
}

/// A frame stamped with the session time it was received at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedFrame {
    /// Session time of the data that completed the frame
    pub time: SessionTime,
    /// The frame itself
    pub frame: DeviceFrame,
}

impl TimedFrame {
    /// Message type id.
    pub fn msg_type(&self) -> u8 {
        self.frame.msg_type
    }

    /// Message payload.
    pub fn payload(&self) -> &[u8] {
        &self.frame.payload
    }
}

/// Outcome of [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete frame and the bytes it used
    Frame {
        /// The decoded frame
        frame: DeviceFrame,
        /// Bytes consumed from the buffer
        consumed: usize,
    },
    /// The buffer holds a valid prefix but not the whole frame
    NeedMore {
        /// Minimum number of additional bytes required
        needed: usize,
    },
}

/// Encode one frame with the filler trailer.
pub fn encode(msg_type: u8, payload: &[u8]) -> Vec<u8> {
    DeviceFrame::new(msg_type, payload.to_vec()).to_bytes()
}

/// Decode the frame at the start of `buf`.
///
/// Fails with `ProtocolDesync` when `buf` does not start with the tag, or
/// with a prefix of it when fewer than six bytes are buffered.
pub fn decode(buf: &[u8]) -> Result<Decoded> {
    let tag_len = buf.len().min(FRAME_TAG.len());
    if buf[..tag_len] != FRAME_TAG[..tag_len] {
        return Err(PyroError::desync(&buf[..buf.len().min(FRAME_HEADER_LEN)]));
    }
    if buf.len() < FRAME_HEADER_LEN {
        return Ok(Decoded::NeedMore {
            needed: FRAME_OVERHEAD - buf.len(),
        });
    }

    let msg_type = buf[FRAME_TAG.len()];
    let length = BigEndian::read_u32(&buf[FRAME_TAG.len() + 1..FRAME_HEADER_LEN]) as u64;
    let total = FRAME_OVERHEAD as u64 + length;
    if (buf.len() as u64) < total {
        return Ok(Decoded::NeedMore {
            needed: usize::try_from(total - buf.len() as u64).unwrap_or(usize::MAX),
        });
    }

    let total = total as usize;
    let payload_end = total - TRAILER_LEN;
    let mut trailer = [0u8; TRAILER_LEN];
    trailer.copy_from_slice(&buf[payload_end..total]);

    Ok(Decoded::Frame {
        frame: DeviceFrame {
            msg_type,
            payload: buf[FRAME_HEADER_LEN..payload_end].to_vec(),
            trailer,
        },
        consumed: total,
    })
}

/// Reassembly buffer for a byte stream delivered in arbitrary chunks.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    policy: ResyncPolicy,
    skipped: u64,
}

impl FrameBuffer {
    /// Empty buffer that treats a lost tag as fatal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer with an explicit desync policy.
    pub fn with_policy(policy: ResyncPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Append received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Take the next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Result<Option<DeviceFrame>> {
        loop {
            match decode(&self.buf) {
                Ok(Decoded::Frame { frame, consumed }) => {
                    self.buf.drain(..consumed);
                    return Ok(Some(frame));
                }
                Ok(Decoded::NeedMore { .. }) => return Ok(None),
                Err(e @ PyroError::ProtocolDesync { .. }) => {
                    if self.policy == ResyncPolicy::Fatal {
                        return Err(e);
                    }
                    let skip = self.resync_point();
                    self.buf.drain(..skip);
                    self.skipped += skip as u64;
                    warn!(
                        context = "FrameBuffer::next_frame",
                        skipped = skip,
                        total_skipped = self.skipped,
                        "Lost frame tag, scanning forward"
                    );
                    if self.buf.is_empty() {
                        return Ok(None);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Buffered bytes not yet returned as frames.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes discarded while scanning for the tag.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// Desync recovery policy.
    pub fn policy(&self) -> ResyncPolicy {
        self.policy
    }

    /// Index of the next position that may start a frame.
    ///
    /// Either a full tag match or a tag prefix running to the end of the
    /// buffer. Never zero, so every call makes progress.
    fn resync_point(&self) -> usize {
        (1..self.buf.len())
            .find(|&i| {
                let rest = &self.buf[i..];
                let n = rest.len().min(FRAME_TAG.len());
                rest[..n] == FRAME_TAG[..n]
            })
            .unwrap_or(self.buf.len())
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Device wire protocol.
//!
//! This module provides:
//! - [`frame`] - Frame encoding, decoding and stream reassembly
//! - [`messages`] - Typed payloads and the decoder table
//! - [`stream`] - Frames re-assembled from a recorded log

pub mod frame;
pub mod messages;
pub mod stream;

pub use frame::{decode, encode, Decoded, DeviceFrame, FrameBuffer, TimedFrame};
pub use messages::{
    DecoderFn, DecoderRegistry, GyroReading, LaserScan, MessageType, MotorCommand,
    OdometryReading, SensorMessage,
};
pub use stream::FrameStream;

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message transports.
//!
//! Control code talks to the device through the [`Transport`] trait, so the
//! same code can drive:
//! - [`LiveTransport`] - a real duplex byte stream, recording both directions
//! - [`ReplayTransport`] - a recorded log, verifying every outbound frame
//! - [`ChannelTransport`] - in-memory channels for simulators and tests

pub mod channel;
pub mod live;
pub mod replay;

pub use channel::{ChannelDevice, ChannelTransport};
pub use live::LiveTransport;
pub use replay::ReplayTransport;

pub use crate::protocol::frame::TimedFrame;

use crate::Result;

/// get/put/annot interface to a device.
pub trait Transport {
    /// Next inbound frame with its session time.
    fn get(&mut self) -> Result<TimedFrame>;

    /// Send one frame to the device.
    fn put(&mut self, msg_type: u8, payload: &[u8]) -> Result<()>;

    /// Mark an event in the recording.
    fn annot(&mut self, data: &[u8]) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn get(&mut self) -> Result<TimedFrame> {
        (**self).get()
    }

    fn put(&mut self, msg_type: u8, payload: &[u8]) -> Result<()> {
        (**self).put(msg_type, payload)
    }

    fn annot(&mut self, data: &[u8]) -> Result<()> {
        (**self).annot(data)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&mut self) -> Result<TimedFrame> {
        (**self).get()
    }

    fn put(&mut self, msg_type: u8, payload: &[u8]) -> Result<()> {
        (**self).put(msg_type, payload)
    }

    fn annot(&mut self, data: &[u8]) -> Result<()> {
        (**self).annot(data)
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory transport backed by crossbeam channels.
//!
//! [`ChannelTransport::pair`] returns the transport handed to control code
//! and the [`ChannelDevice`] end that a simulator or test drives.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use crate::core::SessionTime;
use crate::protocol::frame::{DeviceFrame, TimedFrame};
use crate::transport::Transport;
use crate::{PyroError, Result};

/// Control-code end of an in-memory link.
#[derive(Debug)]
pub struct ChannelTransport {
    inbound: Receiver<TimedFrame>,
    outbound: Sender<DeviceFrame>,
    annotations: Sender<Vec<u8>>,
}

/// Device end of an in-memory link.
#[derive(Debug, Clone)]
pub struct ChannelDevice {
    inbound: Sender<TimedFrame>,
    outbound: Receiver<DeviceFrame>,
    annotations: Receiver<Vec<u8>>,
}

impl ChannelTransport {
    /// Create a connected transport and device.
    pub fn pair() -> (ChannelTransport, ChannelDevice) {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        let (annot_tx, annot_rx) = unbounded();
        (
            ChannelTransport {
                inbound: in_rx,
                outbound: out_tx,
                annotations: annot_tx,
            },
            ChannelDevice {
                inbound: in_tx,
                outbound: out_rx,
                annotations: annot_rx,
            },
        )
    }
}

impl Transport for ChannelTransport {
    /// Blocks until the device sends a frame; fails once it hung up.
    fn get(&mut self) -> Result<TimedFrame> {
        self.inbound.recv().map_err(|_| PyroError::StreamClosed)
    }

    fn put(&mut self, msg_type: u8, payload: &[u8]) -> Result<()> {
        self.outbound
            .send(DeviceFrame::new(msg_type, payload.to_vec()))
            .map_err(|_| PyroError::StreamClosed)
    }

    fn annot(&mut self, data: &[u8]) -> Result<()> {
        self.annotations
            .send(data.to_vec())
            .map_err(|_| PyroError::StreamClosed)
    }
}

impl ChannelDevice {
    /// Queue a frame for the control code.
    pub fn send(&self, time: SessionTime, msg_type: u8, payload: &[u8]) -> Result<()> {
        self.inbound
            .send(TimedFrame {
                time,
                frame: DeviceFrame::new(msg_type, payload.to_vec()),
            })
            .map_err(|_| PyroError::StreamClosed)
    }

    /// Next command sent by the control code, if any is queued.
    pub fn try_recv(&self) -> Option<DeviceFrame> {
        match self.outbound.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next command.
    pub fn recv(&self) -> Result<DeviceFrame> {
        self.outbound.recv().map_err(|_| PyroError::StreamClosed)
    }

    /// Commands queued and not yet received.
    pub fn pending_commands(&self) -> usize {
        self.outbound.len()
    }

    /// Next annotation, if any is queued.
    pub fn try_recv_annotation(&self) -> Option<Vec<u8>> {
        self.annotations.try_recv().ok()
    }
}

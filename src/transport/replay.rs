// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Replay transport over a recorded log.
//!
//! Two independent cursors walk the same log: one re-frames the inbound
//! stream for `get`, the other supplies the recorded outbound frames that
//! `put` checks against. A mismatch means the control code no longer
//! behaves as it did when the log was recorded.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::warn;

use crate::config::{ResyncPolicy, SessionConfig};
use crate::io::constants::stream;
use crate::io::reader::LogReader;
use crate::protocol::frame::{encode, TimedFrame};
use crate::protocol::stream::FrameStream;
use crate::transport::Transport;
use crate::{PyroError, Result};

/// Transport that re-drives control code from a recording.
#[derive(Debug)]
pub struct ReplayTransport<R> {
    inbound: FrameStream<R>,
    outbound: LogReader<R>,
    force: bool,
    commands: u64,
    divergences: u64,
}

impl ReplayTransport<BufReader<File>> {
    /// Replay the log at `path`.
    ///
    /// With `force`, divergent commands are reported and replay continues.
    pub fn open<P: AsRef<Path>>(path: P, force: bool) -> Result<Self> {
        Self::open_with_policy(path, force, ResyncPolicy::default())
    }

    /// Replay with the force flag and desync policy of `config`.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: &SessionConfig) -> Result<Self> {
        Self::open_with_policy(path, config.force_replay, config.resync)
    }

    fn open_with_policy<P: AsRef<Path>>(path: P, force: bool, policy: ResyncPolicy) -> Result<Self> {
        let path = path.as_ref();
        let inbound = LogReader::open(path)?;
        let outbound = LogReader::open(path)?;
        Ok(Self::from_readers(inbound, outbound, force, policy))
    }
}

impl<R: Read> ReplayTransport<R> {
    /// Replay from two readers positioned at the start of the same log.
    pub fn from_readers(
        inbound: LogReader<R>,
        outbound: LogReader<R>,
        force: bool,
        policy: ResyncPolicy,
    ) -> Self {
        Self {
            inbound: FrameStream::inbound(inbound, policy),
            outbound,
            force,
            commands: 0,
            divergences: 0,
        }
    }

    /// True when divergences are tolerated.
    pub fn is_forced(&self) -> bool {
        self.force
    }

    /// Inbound frames replayed so far.
    pub fn frames_replayed(&self) -> u64 {
        self.inbound.frame_count()
    }

    /// Outbound frames checked so far.
    pub fn commands_checked(&self) -> u64 {
        self.commands
    }

    /// Outbound frames that differed from the recording.
    pub fn divergences(&self) -> u64 {
        self.divergences
    }
}

impl<R: Read> Transport for ReplayTransport<R> {
    fn get(&mut self) -> Result<TimedFrame> {
        self.inbound.next_frame()
    }

    fn put(&mut self, msg_type: u8, payload: &[u8]) -> Result<()> {
        let actual = encode(msg_type, payload);
        let reference = self.outbound.read(Some(stream::OUTBOUND))?;
        self.commands += 1;

        if reference.payload != actual {
            self.divergences += 1;
            let err = PyroError::divergence(reference.offset.as_micros(), &reference.payload, &actual);
            if !self.force {
                return Err(err);
            }
            warn!(
                context = "ReplayTransport::put",
                time = %reference.offset,
                error = %err,
                "Replay divergence ignored"
            );
        }
        Ok(())
    }

    fn annot(&mut self, _data: &[u8]) -> Result<()> {
        Ok(())
    }
}

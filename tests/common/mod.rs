// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pyrolog::core::ManualClock;
use pyrolog::protocol::encode;
use pyrolog::protocol::messages::{LASER_PAYLOAD_LEN, LASER_SAMPLES};
use pyrolog::{LogWriter, SessionStart};

// ============================================================================
// Temporary Files
// ============================================================================

/// Get a unique temporary directory for test files.
pub fn temp_dir(tag: &str) -> PathBuf {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    std::env::temp_dir().join(format!(
        "pyrolog_{}_{}_{}",
        tag,
        std::process::id(),
        random
    ))
}

/// Create a temporary directory that is removed when the guard drops.
pub fn temp_workspace(tag: &str) -> (PathBuf, CleanupGuard) {
    let dir = temp_dir(tag);
    fs::create_dir_all(&dir).unwrap();
    (dir.clone(), CleanupGuard(dir))
}

/// Cleanup guard for test temporary files
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// ============================================================================
// In-Memory Logs
// ============================================================================

/// Byte sink that stays readable after the writer takes ownership.
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Session start used by every fixture: 2017-06-15 13:45:07.250000.
pub fn session_start() -> SessionStart {
    SessionStart::from_parts(2017, 6, 15, 13, 45, 7, 250_000).unwrap()
}

/// In-memory writer driven by a manual clock.
pub fn memory_writer() -> (Arc<LogWriter>, SharedBuf, ManualClock) {
    let buf = SharedBuf::default();
    let clock = ManualClock::new();
    let writer = LogWriter::with_clock(buf.clone(), session_start(), clock.clone()).unwrap();
    (Arc::new(writer), buf, clock)
}

// ============================================================================
// Device Messages
// ============================================================================

/// Laser payload with every range set to `range` mm.
pub fn laser_payload(range: u16) -> Vec<u8> {
    let mut payload = Vec::with_capacity(LASER_PAYLOAD_LEN);
    for _ in 0..LASER_SAMPLES {
        payload.extend_from_slice(&range.to_be_bytes());
    }
    payload.resize(LASER_PAYLOAD_LEN, 0);
    payload
}

/// Bytes the device sends in cycle `k`: odometry then laser.
///
/// Odometry channels advance by one tick per side each cycle, so after the
/// baseline every cycle adds one left and one right tick.
pub fn sensor_cycle(k: u32) -> Vec<u8> {
    let bit = if k % 2 == 0 { 0x00 } else { 0x01 };
    let mut bytes = encode(0x06, &[bit, 0x00, bit, 0x00]);
    bytes.extend(encode(0x07, &laser_payload(800 + k as u16)));
    bytes
}

// ============================================================================
// Simulated Device
// ============================================================================

/// Device stream that answers one scripted burst per read.
///
/// Each burst advances the session clock by `step` before it is returned,
/// so records get distinct, evenly spaced offsets.
pub struct SimDevice {
    bursts: VecDeque<Vec<u8>>,
    current: Vec<u8>,
    clock: ManualClock,
    step: Duration,
    pub output: Vec<u8>,
}

impl SimDevice {
    pub fn new(bursts: Vec<Vec<u8>>, clock: ManualClock, step: Duration) -> Self {
        Self {
            bursts: bursts.into(),
            current: Vec::new(),
            clock,
            step,
            output: Vec::new(),
        }
    }

    /// Device sending `cycles` sensor bursts.
    pub fn with_cycles(cycles: u32, clock: ManualClock, step: Duration) -> Self {
        Self::new((0..cycles).map(sensor_cycle).collect(), clock, step)
    }
}

impl Read for SimDevice {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.current.is_empty() {
            match self.bursts.pop_front() {
                Some(next) => {
                    self.clock.advance(self.step);
                    self.current = next;
                }
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.drain(..n);
        Ok(n)
    }
}

impl Write for SimDevice {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Device message payloads.
//!
//! Each known message type has a fixed payload size; a frame of a known
//! type with any other size means the device speaks a different protocol
//! version and decoding fails with `PayloadSizeMismatch`.
//!
//! Decoders are looked up by type id in a [`DecoderRegistry`]. Types
//! without a registered decoder are skipped by the caller.

use std::collections::BTreeMap;
use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::{PyroError, Result};

/// Number of range samples in one laser scan.
pub const LASER_SAMPLES: usize = 271;

/// Laser payload: big-endian ranges followed by one auxiliary byte per sample.
pub const LASER_PAYLOAD_LEN: usize = 2 * LASER_SAMPLES + LASER_SAMPLES;

/// Odometry payload: one byte per encoder channel.
pub const ODOMETRY_PAYLOAD_LEN: usize = 4;

/// Gyro payload: three big-endian i16 axes.
pub const GYRO_PAYLOAD_LEN: usize = 6;

/// Motor payload: two i8 wheel powers.
pub const MOTOR_PAYLOAD_LEN: usize = 2;

/// Gyro gain in millidegrees per second per raw unit.
pub const GYRO_GAIN_MDPS: f64 = 30.5;

/// Message type ids known to the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Wheel power command
    Motor = 0x01,
    /// Wheel encoder bits
    Odometry = 0x06,
    /// Laser range scan
    Laser = 0x07,
    /// Gyroscope rates
    Gyro = 0x0A,
}

impl MessageType {
    /// Wire id.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Look up a known id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(MessageType::Motor),
            0x06 => Some(MessageType::Odometry),
            0x07 => Some(MessageType::Laser),
            0x0A => Some(MessageType::Gyro),
            _ => None,
        }
    }

    /// Required payload size.
    pub const fn payload_len(self) -> usize {
        match self {
            MessageType::Motor => MOTOR_PAYLOAD_LEN,
            MessageType::Odometry => ODOMETRY_PAYLOAD_LEN,
            MessageType::Laser => LASER_PAYLOAD_LEN,
            MessageType::Gyro => GYRO_PAYLOAD_LEN,
        }
    }

    /// Lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            MessageType::Motor => "motor",
            MessageType::Odometry => "odometry",
            MessageType::Laser => "laser",
            MessageType::Gyro => "gyro",
        }
    }

    fn check_len(self, payload: &[u8]) -> Result<()> {
        if payload.len() != self.payload_len() {
            return Err(PyroError::size_mismatch(
                self.id(),
                self.payload_len(),
                payload.len(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#04x})", self.name(), self.id())
    }
}

/// One laser scan in millimeters, 0 meaning no return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaserScan {
    /// Range samples in scan order
    pub ranges: Vec<u16>,
}

impl LaserScan {
    /// Decode a laser payload, ignoring the auxiliary bytes.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        MessageType::Laser.check_len(payload)?;
        let mut ranges = vec![0u16; LASER_SAMPLES];
        BigEndian::read_u16_into(&payload[..2 * LASER_SAMPLES], &mut ranges);
        Ok(Self { ranges })
    }

    /// Scan with `trim` samples removed at each edge.
    ///
    /// A trim of 45 keeps the central 181 samples, a 180 degree view.
    pub fn trimmed(&self, trim: usize) -> &[u16] {
        if trim * 2 >= self.ranges.len() {
            return &[];
        }
        &self.ranges[trim..self.ranges.len() - trim]
    }

    /// Closest valid return.
    pub fn nearest(&self) -> Option<u16> {
        self.ranges.iter().copied().filter(|&r| r > 0).min()
    }

    /// Farthest return, 0 when the scan is empty.
    pub fn farthest(&self) -> u16 {
        self.ranges.iter().copied().max().unwrap_or(0)
    }

    /// Coarse text profile of the scan.
    ///
    /// One character per `step` samples: `X` under 0.5 m, `x` under 1 m,
    /// `.` under 1.5 m, blank otherwise. Missing returns count as far.
    pub fn profile(ranges: &[u16], step: usize) -> String {
        ranges
            .chunks(step.max(1))
            .map(|group| {
                let nearest = group
                    .iter()
                    .map(|&r| if r == 0 { 10_000 } else { r })
                    .min()
                    .unwrap_or(10_000);
                match nearest {
                    0..=499 => 'X',
                    500..=999 => 'x',
                    1000..=1499 => '.',
                    _ => ' ',
                }
            })
            .collect()
    }
}

/// Raw encoder bits of the four wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OdometryReading {
    /// Channels in wire order: FR, RR, RL, FL
    pub channels: [u8; ODOMETRY_PAYLOAD_LEN],
}

impl OdometryReading {
    /// Decode an odometry payload.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        MessageType::Odometry.check_len(payload)?;
        let mut channels = [0u8; ODOMETRY_PAYLOAD_LEN];
        channels.copy_from_slice(payload);
        Ok(Self { channels })
    }

    /// Ticks since `prev` as (left, right).
    ///
    /// Each channel toggles one bit per tick, so the tick count is the
    /// number of bits that changed. Right is FR + RR, left is RL + FL.
    pub fn ticks_since(&self, prev: &OdometryReading) -> (u64, u64) {
        let bits = |i: usize| (self.channels[i] ^ prev.channels[i]).count_ones() as u64;
        let right = bits(0) + bits(1);
        let left = bits(2) + bits(3);
        (left, right)
    }
}

/// Raw gyroscope rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GyroReading {
    /// X, Y, Z in raw units
    pub axes: [i16; 3],
}

impl GyroReading {
    /// Decode a gyro payload.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        MessageType::Gyro.check_len(payload)?;
        let mut axes = [0i16; 3];
        BigEndian::read_i16_into(payload, &mut axes);
        Ok(Self { axes })
    }

    /// Rates in degrees per second.
    pub fn to_dps(&self) -> [f64; 3] {
        self.axes.map(|raw| raw as f64 * GYRO_GAIN_MDPS / 1000.0)
    }
}

/// Power levels of the two wheel sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorCommand {
    /// Left side power
    pub left: i8,
    /// Right side power
    pub right: i8,
}

impl MotorCommand {
    /// Create a command.
    pub const fn new(left: i8, right: i8) -> Self {
        Self { left, right }
    }

    /// Decode a motor payload.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        MessageType::Motor.check_len(payload)?;
        Ok(Self {
            left: payload[0] as i8,
            right: payload[1] as i8,
        })
    }

    /// Wire payload.
    pub fn to_payload(self) -> [u8; MOTOR_PAYLOAD_LEN] {
        [self.left as u8, self.right as u8]
    }
}

/// Decoded content of one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorMessage {
    /// Laser scan
    Laser(LaserScan),
    /// Encoder bits
    Odometry(OdometryReading),
    /// Gyro rates
    Gyro(GyroReading),
    /// Motor command echo
    Motor(MotorCommand),
}

impl SensorMessage {
    /// Variant name.
    pub fn name(&self) -> &'static str {
        match self {
            SensorMessage::Laser(_) => "laser",
            SensorMessage::Odometry(_) => "odometry",
            SensorMessage::Gyro(_) => "gyro",
            SensorMessage::Motor(_) => "motor",
        }
    }
}

/// Decoder from payload bytes to a message.
pub type DecoderFn = fn(&[u8]) -> Result<SensorMessage>;

/// Decode a laser payload.
pub fn decode_laser(payload: &[u8]) -> Result<SensorMessage> {
    LaserScan::decode(payload).map(SensorMessage::Laser)
}

/// Decode an odometry payload.
pub fn decode_odometry(payload: &[u8]) -> Result<SensorMessage> {
    OdometryReading::decode(payload).map(SensorMessage::Odometry)
}

/// Decode a gyro payload.
pub fn decode_gyro(payload: &[u8]) -> Result<SensorMessage> {
    GyroReading::decode(payload).map(SensorMessage::Gyro)
}

/// Decode a motor payload.
pub fn decode_motor(payload: &[u8]) -> Result<SensorMessage> {
    MotorCommand::decode(payload).map(SensorMessage::Motor)
}

/// Table from message type id to decoder.
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: BTreeMap<u8, DecoderFn>,
}

impl DecoderRegistry {
    /// Registry with no decoders.
    pub fn empty() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    /// Register `decoder` for `msg_type`, returning the one it replaces.
    pub fn register(&mut self, msg_type: u8, decoder: DecoderFn) -> Option<DecoderFn> {
        self.decoders.insert(msg_type, decoder)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, msg_type: u8, decoder: DecoderFn) -> Self {
        self.register(msg_type, decoder);
        self
    }

    /// Remove the decoder for `msg_type`.
    pub fn unregister(&mut self, msg_type: u8) -> Option<DecoderFn> {
        self.decoders.remove(&msg_type)
    }

    /// Check if `msg_type` has a decoder.
    pub fn contains(&self, msg_type: u8) -> bool {
        self.decoders.contains_key(&msg_type)
    }

    /// Registered type ids in ascending order.
    pub fn ids(&self) -> Vec<u8> {
        self.decoders.keys().copied().collect()
    }

    /// Decode a payload; `None` for types without a decoder.
    pub fn decode(&self, msg_type: u8, payload: &[u8]) -> Result<Option<SensorMessage>> {
        match self.decoders.get(&msg_type) {
            Some(decoder) => decoder(payload).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for DecoderRegistry {
    /// Laser, odometry and gyro decoders.
    fn default() -> Self {
        Self::empty()
            .with(MessageType::Laser.id(), decode_laser)
            .with(MessageType::Odometry.id(), decode_odometry)
            .with(MessageType::Gyro.id(), decode_gyro)
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

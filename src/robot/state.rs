// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Robot state machine.
//!
//! One control cycle pulls frames from the transport and folds every
//! decodable one into the [`RobotSnapshot`] until a frame of the terminal
//! type arrives. It then sends exactly one motor command carrying the
//! current [`MotorIntent`]. Frames without a registered decoder are
//! skipped.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::time::Duration;
//! use pyrolog::robot::Robot;
//! use pyrolog::transport::ReplayTransport;
//!
//! let mut robot = Robot::new(ReplayTransport::open("naio170615_134507.log", false)?);
//! robot.move_forward();
//! robot.wait(Duration::from_secs(3))?;
//! println!("{:.2} m", robot.snapshot().distance_m());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::trace;

use crate::config::SessionConfig;
use crate::core::SessionTime;
use crate::protocol::messages::{
    DecoderRegistry, MessageType, OdometryReading, SensorMessage,
};
use crate::robot::motion::MotorIntent;
use crate::robot::snapshot::RobotSnapshot;
use crate::transport::Transport;
use crate::Result;

/// Sensor aggregation and command emission over a transport.
pub struct Robot<T> {
    transport: T,
    registry: DecoderRegistry,
    terminal: u8,
    laser_trim: usize,
    snapshot: RobotSnapshot,
    prev_odometry: Option<OdometryReading>,
    intent: MotorIntent,
    cycles: u64,
}

impl<T: Transport> Robot<T> {
    /// Robot with default settings: laser ends a cycle, no trimming.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &SessionConfig::default())
    }

    /// Robot using the terminal type and laser trim of `config`.
    pub fn with_config(transport: T, config: &SessionConfig) -> Self {
        Self {
            transport,
            registry: DecoderRegistry::default(),
            terminal: config.terminal_message,
            laser_trim: config.laser_trim,
            snapshot: RobotSnapshot::default(),
            prev_odometry: None,
            intent: MotorIntent::Stop,
            cycles: 0,
        }
    }

    /// Change the message type that ends a cycle.
    pub fn set_terminal(&mut self, msg_type: u8) {
        self.terminal = msg_type;
    }

    /// Message type that ends a cycle.
    pub fn terminal(&self) -> u8 {
        self.terminal
    }

    /// Decoder table, for registering extra message types.
    pub fn registry_mut(&mut self) -> &mut DecoderRegistry {
        &mut self.registry
    }

    /// Run one control cycle.
    pub fn update(&mut self) -> Result<()> {
        loop {
            let frame = self.transport.get()?;
            self.snapshot.time = Some(frame.time);
            if let Some(message) = self.registry.decode(frame.msg_type(), frame.payload())? {
                self.apply(message);
            }
            if frame.msg_type() == self.terminal {
                break;
            }
        }

        let command = self.intent.command();
        self.transport
            .put(MessageType::Motor.id(), &command.to_payload())?;
        self.cycles += 1;
        trace!(
            context = "Robot::update",
            cycle = self.cycles,
            intent = %self.intent,
            "Command sent"
        );
        Ok(())
    }

    /// Run cycles until session time advanced by at least `duration`.
    ///
    /// Runs one cycle first if no message has arrived yet.
    pub fn wait(&mut self, duration: Duration) -> Result<()> {
        if self.snapshot.time.is_none() {
            self.update()?;
        }
        let start = self.now();
        while self.now().saturating_since(start) < duration {
            self.update()?;
        }
        Ok(())
    }

    /// Drive straight ahead.
    pub fn move_forward(&mut self) {
        self.intent = MotorIntent::Forward;
    }

    /// Drive straight back.
    pub fn move_backward(&mut self) {
        self.intent = MotorIntent::Backward;
    }

    /// Arc to the left.
    pub fn move_left(&mut self) {
        self.intent = MotorIntent::Left;
    }

    /// Arc to the right.
    pub fn move_right(&mut self) {
        self.intent = MotorIntent::Right;
    }

    /// Spin left in place.
    pub fn turn_left(&mut self) {
        self.intent = MotorIntent::TurnLeft;
    }

    /// Spin right in place.
    pub fn turn_right(&mut self) {
        self.intent = MotorIntent::TurnRight;
    }

    /// Idle both sides.
    pub fn stop(&mut self) {
        self.intent = MotorIntent::Stop;
    }

    /// Select any intent.
    pub fn set_intent(&mut self, intent: MotorIntent) {
        self.intent = intent;
    }

    /// Mark an event in the recording.
    pub fn annot(&mut self, data: &[u8]) -> Result<()> {
        self.transport.annot(data)
    }

    /// Current sensor state.
    pub fn snapshot(&self) -> &RobotSnapshot {
        &self.snapshot
    }

    /// Intent sent with the next command.
    pub fn motor_intent(&self) -> MotorIntent {
        self.intent
    }

    /// Completed control cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn now(&self) -> SessionTime {
        self.snapshot.time.unwrap_or(SessionTime::ZERO)
    }

    fn apply(&mut self, message: SensorMessage) {
        match message {
            SensorMessage::Laser(scan) => {
                self.snapshot.laser = Some(scan.trimmed(self.laser_trim).to_vec());
            }
            SensorMessage::Odometry(reading) => {
                // The first reading only sets the baseline.
                if let Some(prev) = &self.prev_odometry {
                    let (left, right) = reading.ticks_since(prev);
                    self.snapshot.odometry_left_raw += left;
                    self.snapshot.odometry_right_raw += right;
                }
                self.prev_odometry = Some(reading);
            }
            SensorMessage::Gyro(gyro) => self.snapshot.gyro = Some(gyro),
            SensorMessage::Motor(_) => {}
        }
    }
}

impl<T> std::fmt::Debug for Robot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Robot")
            .field("terminal", &self.terminal)
            .field("intent", &self.intent)
            .field("cycles", &self.cycles)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

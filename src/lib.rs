// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Pyrolog
//!
//! Record and replay substrate for a wheeled robot speaking the NAIO01
//! framed protocol.
//!
//! The library is organized in layers:
//! - `io/` - The multiplexed log container (writer, reader, side channel)
//! - `protocol/` - Device frame codec and message decoders
//! - `transport/` - Live, replay and in-memory transports
//! - `robot/` - Sensor aggregation and command emission
//!
//! ## Example: Recording a session
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::net::TcpStream;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pyrolog::{LiveTransport, LogWriter, Robot};
//!
//! let writer = Arc::new(LogWriter::create_in(".", "naio", "field test")?);
//! let stream = TcpStream::connect("127.0.0.1:5559")?;
//! let mut robot = Robot::new(LiveTransport::new(stream, Arc::clone(&writer)));
//!
//! robot.move_forward();
//! robot.wait(Duration::from_secs(3))?;
//! robot.stop();
//! robot.update()?;
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Replaying it
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pyrolog::{ReplayTransport, Robot};
//!
//! let mut robot = Robot::new(ReplayTransport::open("naio170615_134507.log", false)?);
//! robot.move_forward();
//! while robot.update().is_ok() {}
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{PyroError, Result, SessionStart, SessionTime};

// Session configuration
pub mod config;

pub use config::{ResyncPolicy, SessionConfig, SideChannelConfig};

// Log container
pub mod io;

pub use io::{LogReader, LogRecord, LogWriter, SideChannelCapture, StreamFilter, StreamId};

// Device protocol
pub mod protocol;

pub use protocol::{DeviceFrame, FrameBuffer, MessageType, SensorMessage};

// Transports
pub mod transport;

pub use transport::{ChannelTransport, LiveTransport, ReplayTransport, TimedFrame, Transport};

// Robot state machine
pub mod robot;

pub use robot::{MotorIntent, Robot, RobotSnapshot};

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Robot state machine and its read view.

pub mod motion;
pub mod snapshot;
pub mod state;

pub use motion::MotorIntent;
pub use snapshot::{RobotSnapshot, METERS_PER_TICK};
pub use state::Robot;

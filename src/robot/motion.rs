// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Discrete motion intents and their wheel power presets.

use std::fmt;

use crate::protocol::messages::MotorCommand;

/// Wheel power used by every preset.
pub const CRUISE_POWER: i8 = 0x70;

/// Reduced power of the inner side in gentle turns.
pub const TURN_POWER: i8 = 0x40;

/// Selected motion of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotorIntent {
    /// Both sides idle
    #[default]
    Stop,
    /// Straight ahead
    Forward,
    /// Straight back
    Backward,
    /// Forward arc to the left
    Left,
    /// Forward arc to the right
    Right,
    /// Spin in place to the left
    TurnLeft,
    /// Spin in place to the right
    TurnRight,
}

impl MotorIntent {
    /// Wheel powers of the preset.
    pub const fn command(self) -> MotorCommand {
        match self {
            MotorIntent::Stop => MotorCommand::new(0, 0),
            MotorIntent::Forward => MotorCommand::new(CRUISE_POWER, CRUISE_POWER),
            MotorIntent::Backward => MotorCommand::new(-CRUISE_POWER, -CRUISE_POWER),
            MotorIntent::Left => MotorCommand::new(TURN_POWER, CRUISE_POWER),
            MotorIntent::Right => MotorCommand::new(CRUISE_POWER, TURN_POWER),
            MotorIntent::TurnLeft => MotorCommand::new(-CRUISE_POWER, CRUISE_POWER),
            MotorIntent::TurnRight => MotorCommand::new(CRUISE_POWER, -CRUISE_POWER),
        }
    }

    /// Lowercase name, as used in annotations.
    pub const fn name(self) -> &'static str {
        match self {
            MotorIntent::Stop => "stop",
            MotorIntent::Forward => "forward",
            MotorIntent::Backward => "backward",
            MotorIntent::Left => "left",
            MotorIntent::Right => "right",
            MotorIntent::TurnLeft => "turn_left",
            MotorIntent::TurnRight => "turn_right",
        }
    }
}

impl fmt::Display for MotorIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

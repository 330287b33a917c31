// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Read view of the robot's sensor state.

use crate::core::SessionTime;
use crate::protocol::messages::GyroReading;

/// Meters travelled per odometry tick summed over both sides.
pub const METERS_PER_TICK: f64 = 6.465 / 400.0;

/// Latest sensor values folded from the device messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotSnapshot {
    /// Laser ranges in mm after edge trimming, `None` before the first scan
    pub laser: Option<Vec<u16>>,
    /// Left side ticks since the first odometry reading
    pub odometry_left_raw: u64,
    /// Right side ticks since the first odometry reading
    pub odometry_right_raw: u64,
    /// Latest gyro rates in raw units
    pub gyro: Option<GyroReading>,
    /// Session time of the latest message, `None` before the first one
    pub time: Option<SessionTime>,
}

impl RobotSnapshot {
    /// Gyro rates in degrees per second.
    pub fn gyro_dps(&self) -> Option<[f64; 3]> {
        self.gyro.map(|g| g.to_dps())
    }

    /// Distance travelled in meters.
    pub fn distance_m(&self) -> f64 {
        (self.odometry_left_raw + self.odometry_right_raw) as f64 * METERS_PER_TICK
    }

    /// Closest laser return in mm.
    pub fn nearest_obstacle(&self) -> Option<u16> {
        self.laser
            .as_ref()
            .and_then(|ranges| ranges.iter().copied().filter(|&r| r > 0).min())
    }
}

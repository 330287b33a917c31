// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Replay command - re-drive the control routine against a recording.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;

use crate::common::{drive_forward, load_config, DriveEnd, Result};
use pyrolog::{ReplayTransport, Robot};

/// Re-drive the control routine against a recorded log.
#[derive(Args, Clone, Debug)]
pub struct ReplayCmd {
    /// Recorded log
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Seconds to drive forward; must match the recording
    #[arg(short, long, default_value_t = 3.0)]
    duration: f64,

    /// Warn instead of failing when a command diverges
    #[arg(short, long)]
    force: bool,

    /// Session config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ReplayCmd {
    pub fn run(self) -> Result<()> {
        let mut config = load_config(self.config.as_deref())?;
        if self.force {
            config = config.force_replay(true);
        }
        let duration = Duration::try_from_secs_f64(self.duration)
            .with_context(|| format!("Invalid duration: {}", self.duration))?;

        let transport = ReplayTransport::open_with_config(&self.file, &config)
            .with_context(|| format!("Failed to open {}", self.file.display()))?;
        let mut robot = Robot::with_config(transport, &config);

        let end = drive_forward(&mut robot, duration)?;
        let cycles = robot.cycles();
        let transport = robot.into_transport();

        println!("=== Replay of {} ===", self.file.display());
        if end == DriveEnd::SourceExhausted {
            println!("Recording ended before the routine finished");
        }
        println!("Control cycles: {}", cycles);
        println!("Frames replayed: {}", transport.frames_replayed());
        println!("Commands checked: {}", transport.commands_checked());
        if transport.is_forced() {
            println!("Divergences: {}", transport.divergences());
        }
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Pyrolog CLI
//!
//! Record, replay and inspect robot sessions.
//!
//! ## Usage
//!
//! ```sh
//! # Show log information
//! pyrolog inspect info naio170615_134507.log
//!
//! # List inbound records
//! pyrolog inspect records naio170615_134507.log --stream 1 --limit 20
//!
//! # Count device frames and report distance
//! pyrolog inspect frames naio170615_134507.log
//!
//! # Drive a robot for 5 seconds, recording the session
//! pyrolog run --host 127.0.0.1 --port 5559 --duration 5
//!
//! # Re-drive the same routine against the recording
//! pyrolog replay naio170615_134507.log --duration 5
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{InspectCmd, ReplayCmd, RunCmd};
use common::Result;

/// Pyrolog - robot session recorder
///
/// Every message exchanged with the robot is recorded in one log file that
/// can later be replayed against the same control code.
#[derive(Parser, Clone)]
#[command(name = "pyrolog")]
#[command(about = "Record, replay and inspect robot sessions", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Inspect log contents (info, records, frames, side channel)
    #[command(subcommand)]
    Inspect(InspectCmd),

    /// Drive a live robot while recording the session
    Run(RunCmd),

    /// Re-drive the control routine against a recording
    Replay(ReplayCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    common::init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect(cmd) => cmd.run(),
        Commands::Run(cmd) => cmd.run(),
        Commands::Replay(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

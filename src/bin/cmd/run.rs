// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Run command - drive a live robot and record the session.

use std::net::{Shutdown, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use crate::common::{drive_forward, load_config, DriveEnd, Result};
use pyrolog::io::ReadSource;
use pyrolog::{LiveTransport, LogWriter, Robot, SideChannelCapture};

/// Drive a live robot while recording every exchanged byte.
#[derive(Args, Clone, Debug)]
pub struct RunCmd {
    /// Robot (or simulator) host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Robot control port
    #[arg(short, long, default_value_t = 5559)]
    port: u16,

    /// Seconds to drive forward before stopping
    #[arg(short, long, default_value_t = 3.0)]
    duration: f64,

    /// Session config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the new log (overrides the config)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Note stored as the first record of the log
    #[arg(long)]
    note: Option<String>,

    /// Side-channel host (defaults to the robot host)
    #[arg(long)]
    side_host: Option<String>,

    /// Side-channel port; capture is off unless given
    #[arg(long)]
    side_port: Option<u16>,
}

impl RunCmd {
    pub fn run(self) -> Result<()> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(dir) = &self.log_dir {
            config = config.log_dir(dir);
        }
        if let Some(note) = &self.note {
            config = config.note(note.as_str());
        }
        let duration = Duration::try_from_secs_f64(self.duration)
            .with_context(|| format!("Invalid duration: {}", self.duration))?;

        let writer = Arc::new(
            LogWriter::create_in(&config.log_dir, &config.log_prefix, &config.note)
                .with_context(|| format!("Failed to create log in {}", config.log_dir.display()))?,
        );
        let log_path = writer.path().map(|p| p.display().to_string());

        let robot_addr = format!("{}:{}", self.host, self.port);
        let stream = TcpStream::connect(&robot_addr)
            .with_context(|| format!("Failed to connect to {}", robot_addr))?;
        info!(address = %robot_addr, "Connected to robot");

        let capture = match self.side_port {
            Some(port) => {
                let host = self.side_host.as_deref().unwrap_or(&self.host);
                let side_addr = format!("{}:{}", host, port);
                let side = TcpStream::connect(&side_addr)
                    .with_context(|| format!("Failed to connect to {}", side_addr))?;
                let control = side.try_clone()?;
                let source = ReadSource::new(side, config.side_channel.chunk_size);
                let handle = SideChannelCapture::spawn(
                    Arc::clone(&writer),
                    source,
                    &config.side_channel,
                )?;
                Some((handle, control))
            }
            None => None,
        };

        let transport = LiveTransport::with_policy(stream, Arc::clone(&writer), config.resync);
        let mut robot = Robot::with_config(transport, &config);
        let end = drive_forward(&mut robot, duration);

        let cycles = robot.cycles();
        let _ = robot.into_transport().into_inner().shutdown(Shutdown::Both);

        if let Some((handle, control)) = capture {
            handle.stop();
            let _ = control.shutdown(Shutdown::Both);
            match handle.join() {
                Ok(stats) => println!(
                    "Side channel: {} records, {} raw bytes, {} compressed",
                    stats.records, stats.raw_bytes, stats.compressed_bytes
                ),
                Err(e) => warn!(error = %e, "Side-channel capture failed"),
            }
        }

        writer.finish()?;

        match end? {
            DriveEnd::Completed => {}
            DriveEnd::SourceExhausted => println!("Robot closed the connection early"),
        }
        println!("Control cycles: {}", cycles);
        println!(
            "Recorded {} records ({} bytes)",
            writer.record_count(),
            writer.bytes_written()
        );
        if let Some(path) = log_path {
            println!("Log: {}", path);
        }
        Ok(())
    }
}

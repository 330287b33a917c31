// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use pyrolog::{Robot, SessionConfig, SessionTime, Transport};
use tracing_subscriber::EnvFilter;

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Install the tracing subscriber, honoring `RUST_LOG`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the session config, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => Ok(SessionConfig::from_toml_file(path)?),
        None => Ok(SessionConfig::default()),
    }
}

/// Format a session offset to a human-readable string.
pub fn format_offset(time: SessionTime) -> String {
    let micros = time.as_micros() as u64;
    let secs = micros / 1_000_000;
    let millis = (micros % 1_000_000) / 1_000;

    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

/// Name of a stream id for display.
pub fn stream_label(stream_id: u16) -> String {
    pyrolog::StreamId::from(stream_id).to_string()
}

/// Progress bar wrapper, hidden when stderr is not a terminal.
pub struct ProgressBar {
    inner: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a progress bar over `total` bytes.
    pub fn new(total: u64, prefix: impl Into<String>) -> Self {
        let inner = std::io::stderr().is_terminal().then(|| {
            let style = indicatif::ProgressStyle::with_template(
                "{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg}",
            )
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("=>-");
            let pb = indicatif::ProgressBar::new(total).with_style(style);
            pb.set_prefix(prefix.into());
            pb
        });
        Self { inner }
    }

    /// Move to an absolute position.
    pub fn set_position(&self, pos: u64) {
        if let Some(pb) = &self.inner {
            pb.set_position(pos);
        }
    }

    /// Finish the progress bar with a message.
    pub fn finish_with_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.finish_with_message(msg);
        }
    }
}

/// How a drive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveEnd {
    /// The routine ran to completion
    Completed,
    /// The device or recording ran out first
    SourceExhausted,
}

/// Drive forward for `duration`, then stop.
///
/// Run and replay share this routine so a recording re-drives exactly the
/// commands it captured. Begin and end are annotated in live sessions.
pub fn drive_forward<T: Transport>(robot: &mut Robot<T>, duration: Duration) -> Result<DriveEnd> {
    let outcome = (|| -> pyrolog::Result<()> {
        robot.annot(b"TAG:forward:BEGIN")?;
        robot.move_forward();
        robot.wait(duration)?;
        robot.stop();
        robot.update()?;
        robot.annot(b"TAG:forward:END")?;
        Ok(())
    })();

    match outcome {
        Ok(()) => Ok(DriveEnd::Completed),
        Err(e) if e.is_end_of_log() || matches!(e, pyrolog::PyroError::StreamClosed) => {
            Ok(DriveEnd::SourceExhausted)
        }
        Err(e) => Err(e.into()),
    }
}

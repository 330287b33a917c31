// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Session configuration.
//!
//! A [`SessionConfig`] can be built fluently in code or loaded from TOML:
//!
//! ```toml
//! log_dir = "logs"
//! log_prefix = "naio"
//! note = "field test"
//! terminal_message = 7
//! laser_trim = 45
//! force_replay = false
//! resync = "scan-forward"
//!
//! [side_channel]
//! chunk_size = 32768
//! compression_level = 3
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::io::constants::MAX_SIDE_CHUNK_LEN;
use crate::protocol::messages::MessageType;
use crate::{PyroError, Result};

/// What the frame reassembly buffer does when the tag is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResyncPolicy {
    /// Fail with `ProtocolDesync`.
    #[default]
    Fatal,
    /// Drop bytes up to the next frame tag and keep going.
    ScanForward,
}

/// Side-channel capture settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SideChannelConfig {
    /// Largest raw chunk read from the source before compression
    pub chunk_size: usize,
    /// zstd compression level
    pub compression_level: i32,
}

impl Default for SideChannelConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32 * 1024,
            compression_level: 3,
        }
    }
}

/// Configuration for one recording or replay session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory that receives new log files
    pub log_dir: PathBuf,
    /// File name prefix of new log files
    pub log_prefix: String,
    /// Free text stored as the first annotation record
    pub note: String,
    /// Message type that closes a control cycle
    pub terminal_message: u8,
    /// Laser samples dropped at each edge of the scan
    pub laser_trim: usize,
    /// Keep replaying when an outbound frame diverges
    pub force_replay: bool,
    /// Recovery when the frame tag is lost
    pub resync: ResyncPolicy,
    /// Side-channel capture settings
    pub side_channel: SideChannelConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("."),
            log_prefix: "naio".to_string(),
            note: String::new(),
            terminal_message: MessageType::Laser.id(),
            laser_trim: 0,
            force_replay: false,
            resync: ResyncPolicy::Fatal,
            side_channel: SideChannelConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PyroError::config(path.display().to_string(), format!("Failed to read: {e}"))
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str, context: &str) -> Result<Self> {
        let config: SessionConfig =
            toml::from_str(text).map_err(|e| PyroError::config(context, e.to_string()))?;
        config.validate(context)?;
        Ok(config)
    }

    /// Check values that the types alone cannot.
    pub fn validate(&self, context: &str) -> Result<()> {
        if self.side_channel.chunk_size == 0 {
            return Err(PyroError::config(context, "side_channel.chunk_size must be > 0"));
        }
        if self.side_channel.chunk_size > MAX_SIDE_CHUNK_LEN {
            return Err(PyroError::config(
                context,
                format!(
                    "side_channel.chunk_size {} exceeds {}",
                    self.side_channel.chunk_size, MAX_SIDE_CHUNK_LEN
                ),
            ));
        }
        Ok(())
    }

    /// Set the log directory.
    pub fn log_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.log_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the log file prefix.
    pub fn log_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_prefix = prefix.into();
        self
    }

    /// Set the session note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Set the cycle-terminating message type.
    pub fn terminal_message(mut self, msg_type: u8) -> Self {
        self.terminal_message = msg_type;
        self
    }

    /// Set how many laser samples to drop at each edge.
    pub fn laser_trim(mut self, trim: usize) -> Self {
        self.laser_trim = trim;
        self
    }

    /// Tolerate replay divergence.
    pub fn force_replay(mut self, force: bool) -> Self {
        self.force_replay = force;
        self
    }

    /// Set the desync recovery policy.
    pub fn resync(mut self, policy: ResyncPolicy) -> Self {
        self.resync = policy;
        self
    }

    /// Set the side-channel zstd level.
    pub fn side_channel_level(mut self, level: i32) -> Self {
        self.side_channel.compression_level = level;
        self
    }

    /// Set the side-channel chunk size.
    pub fn side_channel_chunk_size(mut self, size: usize) -> Self {
        self.side_channel.chunk_size = size;
        self
    }
}

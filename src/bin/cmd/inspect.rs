// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - show log information, records, frames.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use crate::common::{format_offset, stream_label, ProgressBar, Result};
use pyrolog::io::constants::stream;
use pyrolog::io::decompress_side_payload;
use pyrolog::protocol::{DecoderRegistry, FrameStream, LaserScan, OdometryReading};
use pyrolog::robot::METERS_PER_TICK;
use pyrolog::{LogReader, MessageType, PyroError, ResyncPolicy, SensorMessage, StreamFilter};

/// Inspect log contents.
#[derive(Subcommand, Clone, Debug)]
pub enum InspectCmd {
    /// Show session start, per-stream totals and duration
    Info {
        /// Input log
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List records
    Records {
        /// Input log
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Only show this stream id
        #[arg(short, long)]
        stream: Option<u16>,

        /// Stop after N records
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Re-frame the inbound stream and count device messages
    Frames {
        /// Input log
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Skip garbage instead of failing on a lost frame tag
        #[arg(long)]
        scan_forward: bool,

        /// Print a coarse profile of every laser scan
        #[arg(long)]
        profile: bool,
    },

    /// Decompress the side channel into a file
    Side {
        /// Input log
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file for the raw side-channel bytes
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

impl InspectCmd {
    pub fn run(self) -> Result<()> {
        match self {
            InspectCmd::Info { input, json } => cmd_info(input, json),
            InspectCmd::Records {
                input,
                stream,
                limit,
            } => cmd_records(input, stream, limit),
            InspectCmd::Frames {
                input,
                scan_forward,
                profile,
            } => cmd_frames(input, scan_forward, profile),
            InspectCmd::Side { input, output } => cmd_side(input, output),
        }
    }
}

/// Cmd: Show log info
fn cmd_info(input: PathBuf, json: bool) -> Result<()> {
    let reader = LogReader::open(&input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let summary = reader.summary()?;

    if json {
        let streams: Vec<serde_json::Value> = summary
            .streams
            .iter()
            .map(|(&id, stats)| {
                serde_json::json!({
                    "id": id,
                    "name": stream_label(id),
                    "records": stats.records,
                    "bytes": stats.bytes,
                    "first_offset_us": stats.first_offset.as_micros(),
                    "last_offset_us": stats.last_offset.as_micros(),
                })
            })
            .collect();
        let doc = serde_json::json!({
            "file": input.display().to_string(),
            "start": summary.start.to_string(),
            "records": summary.records,
            "duration_us": summary.last_offset.as_micros(),
            "truncated": summary.truncated,
            "streams": streams,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("=== {} ===", input.display());
    println!("Start: {}", summary.start);
    println!("Records: {}", summary.records);
    println!("Duration: {}", format_offset(summary.last_offset));
    if summary.truncated {
        println!("Warning: last record is truncated");
    }

    println!();
    println!("Streams:");
    for (&id, stats) in &summary.streams {
        println!(
            "  [{}] {} | {} records | {} bytes | {} - {}",
            id,
            stream_label(id),
            stats.records,
            stats.bytes,
            format_offset(stats.first_offset),
            format_offset(stats.last_offset)
        );
    }

    Ok(())
}

/// Cmd: List records
fn cmd_records(input: PathBuf, stream_id: Option<u16>, limit: Option<usize>) -> Result<()> {
    let mut reader = LogReader::open(&input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let limit = limit.unwrap_or(usize::MAX);

    for record in reader.records(StreamFilter::from(stream_id)).take(limit) {
        let record = record?;
        let preview = &record.payload[..record.payload.len().min(16)];
        let shown = if record.stream_id == stream::INFO {
            String::from_utf8_lossy(&record.payload).into_owned()
        } else {
            hex::encode(preview)
        };
        println!(
            "{:>12} {:<14} {:>6}  {}",
            record.offset.to_string(),
            stream_label(record.stream_id),
            record.payload.len(),
            shown
        );
    }

    Ok(())
}

/// Cmd: Count device frames
fn cmd_frames(input: PathBuf, scan_forward: bool, profile: bool) -> Result<()> {
    let reader = LogReader::open(&input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let policy = if scan_forward {
        ResyncPolicy::ScanForward
    } else {
        ResyncPolicy::Fatal
    };
    let mut frames = FrameStream::inbound(reader, policy);
    let registry = DecoderRegistry::default();

    let mut counts: BTreeMap<u8, u64> = BTreeMap::new();
    let mut prev_odometry: Option<OdometryReading> = None;
    let mut ticks = 0u64;

    for frame in frames.by_ref() {
        let frame = frame?;
        *counts.entry(frame.msg_type()).or_default() += 1;

        match registry.decode(frame.msg_type(), frame.payload())? {
            Some(SensorMessage::Odometry(reading)) => {
                if let Some(prev) = &prev_odometry {
                    let (left, right) = reading.ticks_since(prev);
                    ticks += left + right;
                }
                prev_odometry = Some(reading);
            }
            Some(SensorMessage::Laser(scan)) if profile => {
                println!(
                    "{:>12} |{}|",
                    frame.time.to_string(),
                    LaserScan::profile(scan.trimmed(45), 5)
                );
            }
            _ => {}
        }
    }

    println!("=== Frames in {} ===", input.display());
    for (msg_type, count) in &counts {
        let name = MessageType::from_id(*msg_type).map_or("unknown", |t| t.name());
        println!("  {:#04x} {:<10} {}", msg_type, name, count);
    }
    println!("Total frames: {}", frames.frame_count());
    if frames.skipped_bytes() > 0 {
        println!("Skipped bytes: {}", frames.skipped_bytes());
    }
    if frames.pending_bytes() > 0 {
        println!("Incomplete trailing bytes: {}", frames.pending_bytes());
    }
    println!("Total distance {:.2}m", ticks as f64 * METERS_PER_TICK);

    Ok(())
}

/// Cmd: Extract side channel
fn cmd_side(input: PathBuf, output: PathBuf) -> Result<()> {
    let mut reader = LogReader::open(&input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut out = BufWriter::new(
        File::create(&output).with_context(|| format!("Failed to create {}", output.display()))?,
    );

    let total = std::fs::metadata(&input)?.len();
    let progress = ProgressBar::new(total, "side");

    let mut records = 0u64;
    let mut bytes = 0u64;
    loop {
        let record = match reader.read(Some(stream::SIDE_CHANNEL)) {
            Ok(record) => record,
            Err(PyroError::EndOfLog) => break,
            Err(e @ PyroError::Truncated { .. }) => {
                tracing::warn!(error = %e, "Log ends mid-record");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let raw = decompress_side_payload(&record.payload)?;
        out.write_all(&raw)?;
        records += 1;
        bytes += raw.len() as u64;
        progress.set_position(reader.position());
    }
    out.flush()?;
    progress.finish_with_message(format!("{records} records"));

    println!(
        "Wrote {} bytes from {} records to {}",
        bytes,
        records,
        output.display()
    );
    Ok(())
}

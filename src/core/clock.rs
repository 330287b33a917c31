// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Session time.
//!
//! A session has one wall-clock start, stored in the log header, and a
//! monotonic offset clock that stamps every record. The offset is returned
//! by each write so callers thread it through as their session time.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

use crate::core::{PyroError, Result};

/// Microseconds since session start.
///
/// The container stores offsets in 32 bits and limits them to one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionTime(u32);

impl SessionTime {
    /// The first offset not representable in a log.
    pub const LIMIT_US: u64 = 3_600_000_000;

    /// Zero offset.
    pub const ZERO: SessionTime = SessionTime(0);

    /// Wrap a raw microsecond offset read from a record.
    pub fn from_micros(us: u32) -> Self {
        SessionTime(us)
    }

    /// Convert an elapsed duration, failing past the one-hour range.
    pub fn from_elapsed(elapsed: Duration) -> Result<Self> {
        let us = elapsed.as_micros();
        if us >= Self::LIMIT_US as u128 {
            return Err(PyroError::TimeRangeExceeded {
                elapsed_us: u64::try_from(us).unwrap_or(u64::MAX),
            });
        }
        Ok(SessionTime(us as u32))
    }

    /// Offset in microseconds.
    pub fn as_micros(self) -> u32 {
        self.0
    }

    /// Offset as a duration.
    pub fn as_duration(self) -> Duration {
        Duration::from_micros(self.0 as u64)
    }

    /// Time elapsed since an earlier offset, zero if `earlier` is later.
    pub fn saturating_since(self, earlier: SessionTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0) as u64)
    }
}

impl fmt::Display for SessionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}s", self.0 / 1_000_000, self.0 % 1_000_000)
    }
}

/// Wall-clock session start with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStart(NaiveDateTime);

impl SessionStart {
    /// Local wall-clock time now, at header precision.
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    /// Wrap a date-time, dropping sub-microsecond precision.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let micros = dt.nanosecond() / 1_000;
        SessionStart(dt.with_nanosecond(micros * 1_000).unwrap_or(dt))
    }

    /// Build from the individual header fields.
    pub fn from_parts(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        microsecond: u32,
    ) -> Result<Self> {
        NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
            .and_then(|d| {
                d.and_hms_micro_opt(hour as u32, minute as u32, second as u32, microsecond)
            })
            .map(SessionStart)
            .ok_or_else(|| {
                PyroError::invalid_header(format!(
                    "start time {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{microsecond:06} is not a valid date"
                ))
            })
    }

    /// The underlying date-time.
    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Calendar year.
    pub fn year(&self) -> u16 {
        self.0.year() as u16
    }

    /// Month, 1-12.
    pub fn month(&self) -> u8 {
        self.0.month() as u8
    }

    /// Day of month, 1-31.
    pub fn day(&self) -> u8 {
        self.0.day() as u8
    }

    /// Hour, 0-23.
    pub fn hour(&self) -> u8 {
        self.0.hour() as u8
    }

    /// Minute, 0-59.
    pub fn minute(&self) -> u8 {
        self.0.minute() as u8
    }

    /// Second, 0-59.
    pub fn second(&self) -> u8 {
        self.0.second() as u8
    }

    /// Microsecond within the second.
    pub fn microsecond(&self) -> u32 {
        self.0.nanosecond() / 1_000
    }

    /// Default log file name for this start, e.g. `naio241018_093005.log`.
    pub fn file_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.0.format("%y%m%d_%H%M%S.log"))
    }
}

impl fmt::Display for SessionStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S%.6f"))
    }
}

/// Source of elapsed session time.
pub trait SessionClock: Send + Sync {
    /// Time elapsed since the session started.
    fn elapsed(&self) -> Duration;
}

/// Monotonic clock started with the session.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start counting now.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl SessionClock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for simulations and tests.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the elapsed time.
    pub fn set(&self, elapsed: Duration) {
        self.micros
            .store(elapsed.as_micros() as u64, Ordering::SeqCst);
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.micros
            .fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }
}

impl SessionClock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_time_limit() {
        let just_under = Duration::from_micros(SessionTime::LIMIT_US - 1);
        assert_eq!(
            SessionTime::from_elapsed(just_under).unwrap().as_micros(),
            3_599_999_999
        );
        let err = SessionTime::from_elapsed(Duration::from_secs(3600)).unwrap_err();
        assert!(matches!(
            err,
            PyroError::TimeRangeExceeded {
                elapsed_us: 3_600_000_000
            }
        ));
    }

    #[test]
    fn test_session_time_display() {
        assert_eq!(SessionTime::from_micros(1_000_200).to_string(), "1.000200s");
    }

    #[test]
    fn test_saturating_since() {
        let a = SessionTime::from_micros(500);
        let b = SessionTime::from_micros(2_500);
        assert_eq!(b.saturating_since(a), Duration::from_micros(2_000));
        assert_eq!(a.saturating_since(b), Duration::ZERO);
    }

    #[test]
    fn test_start_parts_round_trip() {
        let start = SessionStart::from_parts(2017, 6, 15, 13, 45, 7, 123_456).unwrap();
        assert_eq!(start.year(), 2017);
        assert_eq!(start.month(), 6);
        assert_eq!(start.day(), 15);
        assert_eq!(start.hour(), 13);
        assert_eq!(start.minute(), 45);
        assert_eq!(start.second(), 7);
        assert_eq!(start.microsecond(), 123_456);
        assert_eq!(start.file_name("naio"), "naio170615_134507.log");
    }

    #[test]
    fn test_now_has_header_precision() {
        let now = SessionStart::now();
        assert_eq!(now.datetime().nanosecond() % 1_000, 0);
        let restored = SessionStart::from_parts(
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.microsecond(),
        )
        .unwrap();
        assert_eq!(restored, now);
    }

    #[test]
    fn test_start_rejects_invalid_date() {
        assert!(SessionStart::from_parts(2017, 2, 30, 0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(5));
        assert_eq!(other.elapsed(), Duration::from_millis(5));
        other.set(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }
}

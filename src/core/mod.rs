// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout pyrolog.
//!
//! This module provides the foundational types for the library:
//! - [`PyroError`] - Error handling for every layer
//! - [`SessionTime`] / [`SessionStart`] - Session clock values
//! - [`SessionClock`] - Pluggable elapsed-time source

pub mod clock;
pub mod error;

pub use clock::{ManualClock, MonotonicClock, SessionClock, SessionStart, SessionTime};
pub use error::{PyroError, Result};

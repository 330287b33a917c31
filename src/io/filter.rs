// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Stream filtering for log readers.
//!
//! A filter decides which records a reader returns; skipped records are
//! consumed transparently and relative order within a stream is kept.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Filter for selecting streams while reading a log.
#[derive(Clone, Default)]
pub enum StreamFilter {
    /// Read every record (no filtering)
    #[default]
    All,
    /// Read a single stream
    Only(u16),
    /// Read only the listed streams
    Include(HashSet<u16>),
    /// Skip the listed streams
    Exclude(HashSet<u16>),
    /// Custom predicate on the stream id
    Custom(Arc<dyn Fn(u16) -> bool + Send + Sync>),
}

impl fmt::Debug for StreamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.debug_tuple("All").finish(),
            Self::Only(id) => f.debug_tuple("Only").field(id).finish(),
            Self::Include(ids) => f.debug_tuple("Include").field(ids).finish(),
            Self::Exclude(ids) => f.debug_tuple("Exclude").field(ids).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl StreamFilter {
    /// Check if a stream should be returned.
    pub fn should_include(&self, stream_id: u16) -> bool {
        match self {
            StreamFilter::All => true,
            StreamFilter::Only(id) => *id == stream_id,
            StreamFilter::Include(ids) => ids.contains(&stream_id),
            StreamFilter::Exclude(ids) => !ids.contains(&stream_id),
            StreamFilter::Custom(f) => f(stream_id),
        }
    }

    /// Create an include filter from stream ids.
    pub fn include<I: IntoIterator<Item = u16>>(ids: I) -> Self {
        Self::Include(ids.into_iter().collect())
    }

    /// Create an exclude filter from stream ids.
    pub fn exclude<I: IntoIterator<Item = u16>>(ids: I) -> Self {
        Self::Exclude(ids.into_iter().collect())
    }

    /// Create a custom filter from a function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

impl From<Option<u16>> for StreamFilter {
    fn from(stream_id: Option<u16>) -> Self {
        match stream_id {
            Some(id) => StreamFilter::Only(id),
            None => StreamFilter::All,
        }
    }
}

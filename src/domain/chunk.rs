//! Export time windows
//!
//! A [`Chunk`] is a half-open `[from, to)` interval in epoch milliseconds.
//! One chunk maps to exactly one export task.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one day
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Half-open time window `[from, to)` in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    /// Inclusive lower bound
    pub from: i64,
    /// Exclusive upper bound
    pub to: i64,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    /// Width of the window in milliseconds
    pub fn width_millis(&self) -> i64 {
        self.to - self.from
    }

    /// Lower bound as a UTC timestamp
    pub fn start(&self) -> DateTime<Utc> {
        millis_to_datetime(self.from)
    }

    /// Upper bound as a UTC timestamp
    pub fn end(&self) -> DateTime<Utc> {
        millis_to_datetime(self.to)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start().format("%Y-%m-%dT%H:%M:%SZ"),
            self.end().format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

/// Convert epoch milliseconds to a UTC timestamp, clamping values chrono cannot represent
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

//! Time source injection for record timestamps.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::cell::Cell;

/// Source of "now" for `createdAt` / `updatedAt` stamping.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock that advances by a fixed step after every reading.
#[derive(Debug)]
pub struct ManualClock {
    current: Cell<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Cell::new(start),
            step,
        }
    }

    /// Starts at 2024-01-01T00:00:00Z and ticks one second per reading.
    pub fn ticking() -> Self {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .map(|value| value.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Self::new(start, Duration::seconds(1))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let value = self.current.get();
        self.current.set(value + self.step);
        value
    }
}

/// Formats a timestamp the way records store it: `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

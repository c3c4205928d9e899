//! In-process per-event request rate statistics.
//!
//! [`RateTracker`] counts occurrences of named events in whole-minute buckets
//! and reports, for each event, the average number of occurrences per minute
//! over a trailing window (60 minutes unless configured otherwise). Expired
//! buckets are trimmed lazily on every access.

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::error::{Error, Result};
pub use crate::rate_tracker::{EventStatisticSummary, RateTracker};
pub use crate::report::{write_report, Report};

mod clock;
mod error;
mod rate_tracker;
mod report;

#[derive(Debug, Clone)]
pub struct Config {
    //Tracking window length, at least one minute
    pub window_minutes: u32,
}

impl Config {
    #[inline]
    pub fn window_minutes(mut self, window_minutes: u32) -> Self {
        self.window_minutes = window_minutes;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { window_minutes: 60 }
    }
}

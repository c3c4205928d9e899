//! Plain-text rendering of event rate summaries.

use std::fmt;
use std::io::Write;

use crate::error::Result;
use crate::rate_tracker::EventStatisticSummary;

/// Writes one line per summary, or a single "no events" line when
/// `summaries` is empty. Summaries are written in the given order.
pub fn write_report<W: Write>(
    w: &mut W,
    window_minutes: u32,
    summaries: &[EventStatisticSummary],
) -> Result<()> {
    let report = Report {
        window_minutes,
        summaries,
    };
    write!(w, "{}", report)?;
    w.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub window_minutes: u32,
    pub summaries: &'a [EventStatisticSummary],
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summaries.is_empty() {
            return writeln!(
                f,
                "No events happened for the past {} minutes :(",
                self.window_minutes
            );
        }
        writeln!(
            f,
            "Event statistics for the past {} minutes:",
            self.window_minutes
        )?;
        for s in self.summaries {
            // {:?} keeps the fractional part, 1.0 renders as "1.0" not "1"
            writeln!(
                f,
                "Request rate is {:?} requests per minute for '{}' event.",
                s.requests_per_minute, s.event_name
            )?;
        }
        Ok(())
    }
}

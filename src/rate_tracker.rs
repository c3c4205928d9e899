//! A per-event sliding window rate tracker.
//!
//! `RateTracker` keeps, for every event name, a queue of minute buckets ordered
//! by minute. Each occurrence lands in the bucket of the current minute; buckets
//! whose minute falls out of the tracking window are dropped lazily, at the start
//! of every read or write. There is no background sweep.
//!
//! The reported rate is the number of retained occurrences divided by the window
//! length in minutes, regardless of how many minutes actually saw events.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rmqtt_event_stats::{ManualClock, RateTracker};
//!
//! let clock = Arc::new(ManualClock::at_epoch());
//! let tracker = RateTracker::with_default_window(clock.clone());
//! tracker.record("login");
//! assert_eq!(tracker.query("login").requests_per_minute, 1.0 / 60.0);
//!
//! clock.advance(Duration::from_secs(60 * 60));
//! assert_eq!(tracker.query("login").requests_per_minute, 0.0);
//! ```

use std::collections::VecDeque;
use std::io::Write;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::report::write_report;
use crate::Config;

type DashMap<K, V> = dashmap::DashMap<K, V, ahash::RandomState>;

/// Rate of one event over the tracking window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStatisticSummary {
    pub event_name: String,
    pub requests_per_minute: f64,
}

impl EventStatisticSummary {
    #[inline]
    pub fn new(event_name: impl Into<String>, requests_per_minute: f64) -> Self {
        Self {
            event_name: event_name.into(),
            requests_per_minute,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MinuteBucket {
    minute: i64,
    count: u64,
}

pub struct RateTracker<C> {
    clock: C,
    window_minutes: u32,
    buckets: DashMap<String, VecDeque<MinuteBucket>>,
}

impl<C: Clock> RateTracker<C> {
    /// Creates a tracker reading time from `clock`.
    ///
    /// Fails with [`Error::InvalidWindow`] when `cfg.window_minutes` is zero.
    pub fn new(clock: C, cfg: Config) -> Result<Self> {
        if cfg.window_minutes == 0 {
            return Err(Error::InvalidWindow(cfg.window_minutes));
        }
        Ok(Self::build(clock, cfg.window_minutes))
    }

    /// Creates a tracker with the default 60 minute window.
    pub fn with_default_window(clock: C) -> Self {
        Self::build(clock, Config::default().window_minutes)
    }

    fn build(clock: C, window_minutes: u32) -> Self {
        debug!(
            "event rate tracker created, window: {} minutes",
            window_minutes
        );
        Self {
            clock,
            window_minutes,
            buckets: DashMap::default(),
        }
    }

    #[inline]
    pub fn window_minutes(&self) -> u32 {
        self.window_minutes
    }

    /// Records one occurrence of `name` at the current minute.
    pub fn record(&self, name: &str) {
        let now = self.clock.now_minute();
        self.expire(now);

        let oldest_expired = self.oldest_expired(now);
        if let Some(mut buckets) = self.buckets.get_mut(name) {
            add(&mut buckets, now, oldest_expired);
            return;
        }
        trace!("new event '{}', minute: {}", name, now);
        let mut buckets = self.buckets.entry(name.to_owned()).or_default();
        add(&mut buckets, now, oldest_expired);
    }

    /// Rate of `name` over the window, `0.0` for untracked events.
    pub fn query(&self, name: &str) -> EventStatisticSummary {
        let count = self.count(name);
        EventStatisticSummary::new(name, self.rate(count))
    }

    /// One summary per tracked event, ordered by event name.
    pub fn list_all(&self) -> Vec<EventStatisticSummary> {
        let now = self.clock.now_minute();
        self.expire(now);
        let oldest_expired = self.oldest_expired(now);
        let mut summaries = self
            .buckets
            .iter()
            .filter_map(|entry| match total(entry.value(), oldest_expired) {
                0 => None,
                count => Some(EventStatisticSummary::new(entry.key(), self.rate(count))),
            })
            .collect::<Vec<_>>();
        summaries.sort_by(|a, b| a.event_name.cmp(&b.event_name));
        summaries
    }

    /// Total occurrences of `name` retained in the window.
    pub fn count(&self, name: &str) -> u64 {
        let now = self.clock.now_minute();
        self.expire(now);
        let oldest_expired = self.oldest_expired(now);
        self.buckets
            .get(name)
            .map(|b| total(&b, oldest_expired))
            .unwrap_or(0)
    }

    /// Occurrences of `name` in the current minute.
    pub fn recent_count(&self, name: &str) -> u64 {
        let now = self.clock.now_minute();
        self.expire(now);
        self.buckets
            .get(name)
            .and_then(|b| {
                b.back()
                    .filter(|last| last.minute >= now)
                    .map(|last| last.count)
            })
            .unwrap_or(0)
    }

    /// Number of event names with at least one retained occurrence.
    pub fn len(&self) -> usize {
        let now = self.clock.now_minute();
        self.expire(now);
        let oldest_expired = self.oldest_expired(now);
        self.buckets
            .iter()
            .filter(|entry| total(entry.value(), oldest_expired) > 0)
            .count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the textual report of [`RateTracker::list_all`] to `w`.
    pub fn print_statistic<W: Write>(&self, w: &mut W) -> Result<()> {
        write_report(w, self.window_minutes, &self.list_all())
    }

    #[inline]
    fn rate(&self, count: u64) -> f64 {
        count as f64 / self.window_minutes as f64
    }

    /// Latest minute that no longer belongs to the window ending at `now`.
    #[inline]
    fn oldest_expired(&self, now: i64) -> i64 {
        now - i64::from(self.window_minutes)
    }

    /// Drops every bucket with `minute <= now - window`, and every event left
    /// without buckets. Shards are only write-locked when something expired.
    fn expire(&self, now: i64) {
        let oldest_expired = self.oldest_expired(now);
        let stale = self.buckets.iter().any(|entry| {
            entry
                .front()
                .map_or(true, |first| first.minute <= oldest_expired)
        });
        if !stale {
            return;
        }
        self.buckets.retain(|name, buckets| {
            trim(buckets, oldest_expired);
            if buckets.is_empty() {
                debug!("event '{}' expired, no occurrences left in window", name);
                false
            } else {
                true
            }
        });
    }
}

#[inline]
fn trim(buckets: &mut VecDeque<MinuteBucket>, oldest_expired: i64) {
    while buckets
        .front()
        .is_some_and(|first| first.minute <= oldest_expired)
    {
        buckets.pop_front();
    }
}

/// Adds one occurrence at `now` to a queue held under its shard lock.
fn add(buckets: &mut VecDeque<MinuteBucket>, now: i64, oldest_expired: i64) {
    trim(buckets, oldest_expired);
    // A racing caller may have appended a later minute already; keep
    // minutes strictly increasing by folding into the tail.
    if let Some(last) = buckets.back_mut().filter(|last| last.minute >= now) {
        last.count += 1;
    } else {
        buckets.push_back(MinuteBucket {
            minute: now,
            count: 1,
        });
    }
}

/// Occurrences newer than `oldest_expired`. Buckets appended by a writer that
/// read the clock before the reader did are skipped rather than counted.
#[inline]
fn total(buckets: &VecDeque<MinuteBucket>, oldest_expired: i64) -> u64 {
    buckets
        .iter()
        .rev()
        .take_while(|b| b.minute > oldest_expired)
        .map(|b| b.count)
        .sum()
}

//! Time sources consumed by [`RateTracker`](crate::RateTracker).
//!
//! The tracker only ever asks a clock for "now"; it never caches the answer
//! between calls, so advancing a [`ManualClock`] is immediately visible to
//! the next `record`/`query`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MILLIS_PER_MINUTE: i64 = 60_000;

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Current time rounded down to whole minutes since the Unix epoch.
    #[inline]
    fn now_minute(&self) -> i64 {
        self.now_millis().div_euclid(MILLIS_PER_MINUTE)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
///
/// Share it with the tracker through an `Arc` (or a reference) and call
/// [`ManualClock::advance`] to simulate elapsed time.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(start_millis),
        }
    }

    #[inline]
    pub fn at_epoch() -> Self {
        Self::new(0)
    }

    /// Moves the clock forward by `dur`, truncated to whole milliseconds.
    #[inline]
    pub fn advance(&self, dur: Duration) {
        let millis = i64::try_from(dur.as_millis()).unwrap_or(i64::MAX);
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(millis))
            });
    }

    #[inline]
    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

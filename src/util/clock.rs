//! Wall-clock sources and midnight arithmetic.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;

/// Source of wall-clock time for job timestamps and ledger resets.
///
/// Timers (ticks, timeouts) run on the tokio clock; this trait only stamps
/// records, so tests can pin timestamps with [`ManualClock`].
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
        let mut now = self.now.lock();
        *now = now.checked_add_signed(delta).unwrap_or(*now);
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// First midnight strictly after `now`, in `now`'s timezone.
///
/// When a DST transition skips midnight the result falls back to exactly one
/// day after `now`.
#[must_use]
pub fn next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    now.date_naive()
        .succ_opt()
        .and_then(|day| tz.from_local_datetime(&day.and_time(NaiveTime::MIN)).earliest())
        .unwrap_or_else(|| now.clone() + TimeDelta::days(1))
}

/// Time from `now` until the next local midnight.
#[must_use]
pub fn until_next_local_midnight(now: DateTime<Utc>) -> Duration {
    let local = now.with_timezone(&Local);
    (next_midnight(&local) - local)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

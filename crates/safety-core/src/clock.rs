//! Time sources and the calendar-day policy used for daily quotas.

use std::fmt::Debug;
use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, Utc};

/// Source of "now".
pub trait Clock: Send + Sync + Debug {
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

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.lock() = at;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned lock still holds a valid timestamp.
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Where calendar days start.
///
/// One canonical offset for the whole deployment, never per user, so every
/// sender's "today" covers the same instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPolicy {
    offset: FixedOffset,
}

impl DayPolicy {
    /// Days start at midnight UTC.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Days start at midnight in a fixed offset east of UTC.
    ///
    /// Returns `None` when the offset is beyond +/- 24 hours.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The half-open `[start, end)` window of the day containing `at`.
    pub fn day_bounds(&self, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let local_date = at.with_timezone(&self.offset).date_naive();
        let local_midnight = local_date.and_time(NaiveTime::default());
        // A fixed offset has no gaps or folds, so the local midnight maps to
        // exactly one instant.
        let start = (local_midnight - self.offset).and_utc();
        (start, start + Duration::days(1))
    }
}

impl Default for DayPolicy {
    fn default() -> Self {
        Self::utc()
    }
}

//! Wall-clock source for record ids and dates.
//!
//! Books never read the system clock directly so tests can pin "now".

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current local date-time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Current instant as epoch milliseconds, used as the base for record ids.
    ///
    /// The default reads `now()` as UTC, which suits pinned clocks; real
    /// clocks override it with the true instant.
    fn now_epoch_ms(&self) -> i64 {
        self.now().and_utc().timestamp_millis()
    }
}

/// Reads the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_epoch_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// Clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Picks a fresh record id from the clock, bumping past `last_id` when two
/// records land in the same millisecond.
pub(crate) fn next_record_id(clock: &impl Clock, last_id: Option<i64>) -> i64 {
    let now_ms = clock.now_epoch_ms();
    match last_id {
        Some(last) if last >= now_ms => last + 1,
        _ => now_ms,
    }
}

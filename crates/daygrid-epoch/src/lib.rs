//! Calendar-date conversions for daygrid.
//!
//! The interval store works in epoch-day integers (days since 1970-01-01).
//! This crate is the consumer-side bridge: date <-> epoch-day conversion, a
//! validated [`DateInterval`], and the month-index arithmetic a scrolling
//! month list uses to turn a changed day range into the minimal set of month
//! positions to redraw.

use chrono::{Datelike, NaiveDate};
use daygrid_interval::InvalidInterval;
use serde::{Deserialize, Serialize};

// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Days since 1970-01-01 for the given date. The interval coordinate space.
pub fn epoch_day(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

/// The date `day` days after 1970-01-01, or `None` outside chrono's range.
pub fn date_from_epoch_day(day: i64) -> Option<NaiveDate> {
    let days_from_ce = day.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?;
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(days_from_ce).ok()?)
}

/// A closed interval between two calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateInterval {
    /// Rejects `start > end` rather than swapping the endpoints.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidInterval> {
        InvalidInterval::check(epoch_day(start), epoch_day(end))?;
        Ok(Self { start, end })
    }

    /// A single-day interval.
    pub fn on(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Days between the endpoints; zero for a single-day interval.
    pub fn days(&self) -> i64 {
        epoch_day(self.end) - epoch_day(self.start)
    }

    /// Number of distinct calendar months the interval touches, inclusive.
    pub fn months(&self) -> i32 {
        month_ordinal(self.end) - month_ordinal(self.start) + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The interval in store coordinates.
    pub fn day_range(&self) -> (i64, i64) {
        (epoch_day(self.start), epoch_day(self.end))
    }
}

fn month_ordinal(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Position of `date`'s month in a month list starting at `base`'s month.
/// Negative for months before the base.
pub fn month_index(date: NaiveDate, base: NaiveDate) -> i32 {
    month_ordinal(date) - month_ordinal(base)
}

/// Inclusive month-position range covering an epoch-day interval, relative to
/// `base`'s month. This is the minimal redraw range for a changed entry.
/// `None` if either day falls outside chrono's representable dates.
pub fn month_range(start_day: i64, end_day: i64, base: NaiveDate) -> Option<(i32, i32)> {
    let start = date_from_epoch_day(start_day)?;
    let end = date_from_epoch_day(end_day)?;
    Some((month_index(start, base), month_index(end, base)))
}

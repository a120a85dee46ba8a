#![deny(unsafe_code)]
//! Calendar clock driven by a millisecond counter
//!
//! The clock owns the current [`DateTime`] and the counter value of the last
//! whole-second step. Each [`CalendarClock::advance`] call applies only
//! whole elapsed seconds and moves the reference forward by exactly that
//! many milliseconds, so a late or jittery caller never loses or
//! double-counts the sub-second remainder.
//!
//! ## Carry order
//! seconds -> minutes -> hours -> days (and day of week) -> months -> years.
//! Each step works on the value produced by the previous one.

use crate::calendar::{day_of_week, days_in_month};
use crate::datetime::DateTime;
use crate::error::CtsError;

const MILLIS_PER_SECOND: u64 = 1000;

/// Wall clock advanced from a monotonic millisecond counter
#[derive(Debug, Clone)]
pub struct CalendarClock {
    now: DateTime,
    last_reference_ms: u64,
}

impl CalendarClock {
    /// Start the clock at `initial`, with `now_ms` as the counter baseline
    ///
    /// An `initial` value that fails range validation is replaced by
    /// [`DateTime::EPOCH`].
    pub fn new(initial: DateTime, now_ms: u64) -> Self {
        let now = match initial.validate() {
            Ok(()) => initial,
            Err(e) => {
                warn!("Initial time {} rejected ({}), starting at epoch", initial, e);
                DateTime::EPOCH
            }
        };
        Self {
            now,
            last_reference_ms: now_ms,
        }
    }

    /// Apply the whole seconds elapsed since the last step
    ///
    /// Returns the number of seconds applied. A counter value at or before
    /// the reference is a no-op.
    pub fn advance(&mut self, now_ms: u64) -> u64 {
        let elapsed_secs = now_ms.saturating_sub(self.last_reference_ms) / MILLIS_PER_SECOND;
        if elapsed_secs == 0 {
            return 0;
        }
        self.last_reference_ms += elapsed_secs * MILLIS_PER_SECOND;
        self.add_seconds(elapsed_secs);
        elapsed_secs
    }

    /// Replace the clock value with an externally supplied one
    ///
    /// All fields are range checked first; on error the clock is left
    /// untouched. On success the counter baseline is reset to `now_ms` so
    /// time that passed before the write is not applied on top of it.
    pub fn set_authoritative(&mut self, value: DateTime, now_ms: u64) -> Result<(), CtsError> {
        value.validate()?;

        if value.day > days_in_month(value.year, value.month) {
            warn!(
                "Accepting day {} past end of month {} ({} days)",
                value.day,
                value.month,
                days_in_month(value.year, value.month)
            );
        } else if value.day_of_week != day_of_week(value.year, value.month, value.day) {
            warn!(
                "Written day of week {} differs from calendar ({})",
                value.day_of_week,
                day_of_week(value.year, value.month, value.day)
            );
        }

        self.now = value;
        self.last_reference_ms = now_ms;
        Ok(())
    }

    /// Current value
    pub fn snapshot(&self) -> DateTime {
        self.now
    }

    /// Counter value of the last whole-second step or authoritative write
    pub fn last_reference_ms(&self) -> u64 {
        self.last_reference_ms
    }

    fn add_seconds(&mut self, secs: u64) {
        let total_secs = self.now.second as u64 + secs;
        self.now.second = (total_secs % 60) as u8;

        let total_mins = self.now.minute as u64 + total_secs / 60;
        self.now.minute = (total_mins % 60) as u8;

        let total_hours = self.now.hour as u64 + total_mins / 60;
        self.now.hour = (total_hours % 24) as u8;

        let days = total_hours / 24;
        if days > 0 {
            self.add_days(days);
        }
    }

    fn add_days(&mut self, days: u64) {
        let dow = (self.now.day_of_week as u64).saturating_sub(1);
        self.now.day_of_week = ((dow + days) % 7) as u8 + 1;

        let mut day = self.now.day as u64 + days;
        let mut month_days = days_in_month(self.now.year, self.now.month) as u64;
        while day > month_days {
            day -= month_days;
            if self.now.month >= 12 {
                self.now.month = 1;
                self.now.year = self.now.year.wrapping_add(1);
            } else {
                self.now.month += 1;
            }
            month_days = days_in_month(self.now.year, self.now.month) as u64;
        }
        self.now.day = day as u8;
    }
}

impl Default for CalendarClock {
    fn default() -> Self {
        Self::new(DateTime::EPOCH, 0)
    }
}

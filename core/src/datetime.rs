#![deny(unsafe_code)]
//! Calendar date and time value

use crate::error::{CtsError, Field};

/// Wall-clock date and time
///
/// Field ranges follow the Current Time characteristic: month 1-12,
/// day 1-31, hour 0-23, minute and second 0-59, day of week
/// 1 (Monday) to 7 (Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day_of_week: u8,
}

impl DateTime {
    /// Power-on value: 2024-01-01 00:00:00, a Monday
    pub const EPOCH: Self = Self {
        year: 2024,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
        day_of_week: 1,
    };

    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        day_of_week: u8,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            day_of_week,
        }
    }

    /// Check every field against its own range
    ///
    /// Day of month is only checked against 1-31, not against the length of
    /// `month` in `year`.
    pub fn validate(&self) -> Result<(), CtsError> {
        if !(1..=12).contains(&self.month) {
            return Err(CtsError::OutOfRangeField(Field::Month));
        }
        if !(1..=31).contains(&self.day) {
            return Err(CtsError::OutOfRangeField(Field::Day));
        }
        if self.hour > 23 {
            return Err(CtsError::OutOfRangeField(Field::Hour));
        }
        if self.minute > 59 {
            return Err(CtsError::OutOfRangeField(Field::Minute));
        }
        if self.second > 59 {
            return Err(CtsError::OutOfRangeField(Field::Second));
        }
        if !(1..=7).contains(&self.day_of_week) {
            return Err(CtsError::OutOfRangeField(Field::DayOfWeek));
        }
        Ok(())
    }
}

impl Default for DateTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl core::fmt::Display for DateTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} DOW:{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.day_of_week
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DateTime {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{=u16}-{=u8}-{=u8} {=u8}:{=u8}:{=u8} DOW:{=u8}",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.day_of_week
        )
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_epoch_is_valid() {
        assert!(DateTime::EPOCH.validate().is_ok());
        assert_eq!(DateTime::default(), DateTime::EPOCH);
    }

    #[test]
    fn test_validate_rejects_each_field() {
        let base = DateTime::new(2024, 6, 15, 12, 30, 30, 6);
        let cases = [
            (DateTime { month: 0, ..base }, Field::Month),
            (DateTime { month: 13, ..base }, Field::Month),
            (DateTime { day: 0, ..base }, Field::Day),
            (DateTime { day: 32, ..base }, Field::Day),
            (DateTime { hour: 24, ..base }, Field::Hour),
            (DateTime { minute: 60, ..base }, Field::Minute),
            (DateTime { second: 60, ..base }, Field::Second),
            (DateTime { day_of_week: 0, ..base }, Field::DayOfWeek),
            (DateTime { day_of_week: 8, ..base }, Field::DayOfWeek),
        ];
        for (dt, field) in cases {
            assert_eq!(dt.validate(), Err(CtsError::OutOfRangeField(field)));
        }
    }

    #[test]
    fn test_validate_allows_day_past_month_end() {
        // April 31st: each field is within its own range
        let dt = DateTime::new(2024, 4, 31, 0, 0, 0, 3);
        assert!(dt.validate().is_ok());
    }

    #[test]
    fn test_display() {
        let dt = DateTime::new(2024, 2, 9, 7, 5, 3, 5);
        assert_eq!(dt.to_string(), "2024-02-09 07:05:03 DOW:5");
    }
}

//! Gregorian calendar rules
//!
//! Month lengths for the rollover carry, and a day-number mapping used to
//! check the weekday of externally written dates. Day numbers count from
//! the clock epoch, 2024-01-01 (a Monday), so weekday arithmetic needs no
//! offset. The mapping follows Howard Hinnant's "chrono-compatible
//! low-level date algorithms" and holds for any proleptic Gregorian date.
#![deny(unsafe_code)]

/// Days in a 400-year Gregorian cycle
const DAYS_PER_ERA: i32 = 146_097;

/// Day number of 2024-01-01 counted from 0000-03-01
const EPOCH_FROM_MARCH_0000: i32 = 739_191;

/// Gregorian leap-year rule: every 4th year, except centuries not divisible
/// by 400 (2000 is leap, 2100 is not)
pub fn is_leap_year(year: u16) -> bool {
    (year.is_multiple_of(4) && !year.is_multiple_of(100)) || year.is_multiple_of(400)
}

/// Number of days in `month` of `year`
///
/// Months outside 1-12 fall through to 31 so a corrupt month can never
/// stall the day carry loop.
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// ISO weekday of a date, 1 = Monday through 7 = Sunday
pub fn day_of_week(year: u16, month: u8, day: u8) -> u8 {
    (days_from_civil(year, month, day).rem_euclid(7) + 1) as u8
}

/// Day number of a date, 0 = 2024-01-01, negative before it
///
/// Fields are not range checked: day 0 is the last day of the previous
/// month, and the arithmetic is signed so no input can overflow.
pub fn days_from_civil(year: u16, month: u8, day: u8) -> i32 {
    // Count years from March so the leap day is the last day of a year
    let (year, month) = if month <= 2 {
        (i32::from(year) - 1, i32::from(month) + 9)
    } else {
        (i32::from(year), i32::from(month) - 3)
    };

    let era = year.div_euclid(400);
    let year_of_era = year.rem_euclid(400);
    let day_of_year = (153 * month + 2) / 5 + i32::from(day) - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;

    era * DAYS_PER_ERA + day_of_era - EPOCH_FROM_MARCH_0000
}

/// Date of a day number, inverse of [`days_from_civil`]
#[cfg(test)]
fn civil_from_days(days: i32) -> (u16, u8, u8) {
    let shifted = days + EPOCH_FROM_MARCH_0000;
    let era = shifted.div_euclid(DAYS_PER_ERA);
    let day_of_era = shifted.rem_euclid(DAYS_PER_ERA) as u32;

    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    // 0 = March ... 11 = February
    let march_month = (5 * day_of_year + 2) / 153;

    let day = (day_of_year - (153 * march_month + 2) / 5 + 1) as u8;
    let (month, carry) = if march_month < 10 {
        (march_month + 3, 0)
    } else {
        (march_month - 9, 1)
    };
    let year = year_of_era as i32 + era * 400 + carry;

    (year as u16, month as u8, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leap_year_rule() {
        for year in [1996u16, 2000, 2024, 2028, 2400] {
            assert!(is_leap_year(year), "{} is leap", year);
        }
        for year in [1900u16, 2023, 2025, 2100, 2200] {
            assert!(!is_leap_year(year), "{} is common", year);
        }
    }

    #[test]
    fn test_days_in_month_table() {
        let common = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for (month, &len) in (1..=12u8).zip(common.iter()) {
            assert_eq!(days_in_month(2025, month), len);
            let leap_len = if month == 2 { 29 } else { len };
            assert_eq!(days_in_month(2024, month), leap_len);
        }
    }

    #[test]
    fn test_days_in_month_out_of_range_month() {
        assert_eq!(days_in_month(2024, 0), 31);
        assert_eq!(days_in_month(2024, 13), 31);
    }

    #[test]
    fn test_month_table_agrees_with_day_numbers() {
        for year in [1999u16, 2000, 2024, 2100] {
            for month in 1..=12u8 {
                let first = days_from_civil(year, month, 1);
                let last = days_from_civil(year, month, days_in_month(year, month));
                assert_eq!(last - first + 1, i32::from(days_in_month(year, month)));
                let (y, m, d) = civil_from_days(last + 1);
                assert_eq!(d, 1, "{}-{} is followed by a first", year, month);
                assert_eq!((y, m), if month == 12 { (year + 1, 1) } else { (year, month + 1) });
            }
        }
    }

    #[test]
    fn test_epoch_day_number() {
        assert_eq!(days_from_civil(2024, 1, 1), 0);
        assert_eq!(days_from_civil(2023, 12, 31), -1);
        assert_eq!(days_from_civil(2024, 3, 1), 60);
        assert_eq!(days_from_civil(2025, 1, 1), 366);
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(day_of_week(2024, 1, 1), 1); // Monday
        assert_eq!(day_of_week(2024, 2, 29), 4); // Thursday
        assert_eq!(day_of_week(2024, 12, 31), 2); // Tuesday
        assert_eq!(day_of_week(2025, 2, 15), 6); // Saturday
        assert_eq!(day_of_week(2023, 12, 31), 7); // Sunday
        assert_eq!(day_of_week(2000, 1, 1), 6); // Saturday
    }

    #[test]
    fn test_day_zero_is_previous_month_end() {
        assert_eq!(days_from_civil(2024, 3, 0), days_from_civil(2024, 2, 29));
        assert_eq!(day_of_week(2024, 3, 0), 4);
        assert_eq!(days_from_civil(2024, 1, 0), -1);
    }

    #[test]
    fn test_out_of_range_fields_do_not_panic() {
        for (month, day) in [(0u8, 0u8), (13, 1), (255, 255), (2, 255)] {
            let weekday = day_of_week(2024, month, day);
            assert!((1..=7).contains(&weekday));
        }
        let _ = days_from_civil(u16::MAX, 255, 255);
        let _ = days_from_civil(0, 0, 0);
    }

    #[test]
    fn test_day_number_inverse() {
        for days in [-8_766, -1, 0, 59, 60, 365, 366, 27_000] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, m, d), days);
        }
        assert_eq!(civil_from_days(59), (2024, 2, 29));
        assert_eq!(civil_from_days(-8_766), (2000, 1, 1));
    }
}

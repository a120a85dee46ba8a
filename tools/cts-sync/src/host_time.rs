//! Host clock to Current Time record and back

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use cts_core::codec::{decode_current_time, encode_current_time, CURRENT_TIME_LEN};
use cts_core::{AdjustReason, DateTime};

use crate::error::SyncError;

/// Calendar fields of `now`, weekday 1 = Monday
pub fn to_cts(now: &NaiveDateTime) -> Result<DateTime, SyncError> {
    let year = u16::try_from(now.year()).map_err(|_| SyncError::UnrepresentableTime)?;
    Ok(DateTime::new(
        year,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
        now.weekday().number_from_monday() as u8,
    ))
}

/// Current Time record for a manual update to `now`
pub fn current_time_payload(now: &NaiveDateTime) -> Result<[u8; CURRENT_TIME_LEN], SyncError> {
    Ok(encode_current_time(&to_cts(now)?, AdjustReason::MANUAL_TIME_UPDATE))
}

/// Decode a record read back from the watch
pub fn from_record(record: &[u8]) -> Result<NaiveDateTime, SyncError> {
    let dt = decode_current_time(record)?.date_time;
    NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))
        .and_then(|date| {
            date.and_hms_opt(
                u32::from(dt.hour),
                u32::from(dt.minute),
                u32::from(dt.second),
            )
        })
        .ok_or(SyncError::UnrepresentableTime)
}

/// Watch time minus host time in whole seconds
pub fn drift_seconds(record: &[u8], host_now: &NaiveDateTime) -> Result<i64, SyncError> {
    let device = from_record(record)?;
    Ok((device - host_now.with_nanosecond(0).unwrap_or(*host_now)).num_seconds())
}

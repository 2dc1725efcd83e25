use chrono::{Datelike, Duration, NaiveDate};

use crate::engine::errors::CalendarError;
use crate::engine::types::{EPOCH_DAYS_FROM_CE, MICROS_PER_SECOND, timestamp_from_micros};

/// Last day of the month containing `date` (days since 1970-01-01).
pub fn last_day(date: Option<i32>) -> Result<Option<i32>, CalendarError> {
    let Some(days) = date else {
        return Ok(None);
    };
    let date = date_from_days(days)?;
    Ok(Some(days_from_date(month_end(date)?)))
}

/// Last day of the month containing the timestamp's UTC date.
pub fn last_day_of_timestamp(ts: Option<i64>) -> Result<Option<i32>, CalendarError> {
    let Some(micros) = ts else {
        return Ok(None);
    };
    let date = timestamp_from_micros(micros)
        .ok_or(CalendarError::OutOfRange(micros))?
        .date();
    Ok(Some(days_from_date(month_end(date)?)))
}

/// `HH:MM:SS` for a number of seconds. Hours are not wrapped at 24.
pub fn format_duration(seconds: Option<i32>) -> Option<String> {
    let seconds = seconds?;
    let total = i64::from(seconds).unsigned_abs();
    let sign = if seconds < 0 { "-" } else { "" };
    Some(format!(
        "{}{:02}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    ))
}

/// Floors `ts` onto the grid `base + k * interval_secs`.
///
/// Any NULL argument yields NULL. `base` later than `ts` is an error.
pub fn normalize_time(
    ts: Option<i64>,
    base: Option<i64>,
    interval_secs: Option<i32>,
) -> Result<Option<i64>, CalendarError> {
    let (Some(ts), Some(base), Some(interval_secs)) = (ts, base, interval_secs) else {
        return Ok(None);
    };
    if base > ts {
        return Err(CalendarError::BaseAfterInput);
    }
    if interval_secs <= 0 {
        return Err(CalendarError::InvalidInterval(interval_secs));
    }

    let diff = ts.checked_sub(base).ok_or(CalendarError::OutOfRange(ts))?;
    if diff == 0 {
        return Ok(Some(ts));
    }
    let step = i64::from(interval_secs) * MICROS_PER_SECOND;
    if diff < step {
        return Ok(Some(base));
    }
    if diff % step == 0 {
        return Ok(Some(ts));
    }
    Ok(Some(base + (diff / step) * step))
}

fn date_from_days(days: i32) -> Result<NaiveDate, CalendarError> {
    days.checked_add(EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or(CalendarError::OutOfRange(i64::from(days)))
}

fn days_from_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn month_end(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first_of_next| first_of_next - Duration::days(1))
        .ok_or(CalendarError::OutOfRange(i64::from(days_from_date(date))))
}

//! Conversion between calendar values and workbook date serials
//!
//! Serial numbers count days since the workbook epoch, with the time of day as
//! the fractional part. The 1900 system keeps the historical phantom
//! 1900-02-29 (serial 60), so every serial from 61 onward is one higher than
//! the plain day count.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const MS_PER_DAY: i64 = 86_400_000;

/// Serial of the phantom 1900-02-29
const PHANTOM_LEAP_DAY: i64 = 60;

fn epoch(date_1904: bool) -> Option<NaiveDate> {
    if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        // Day 0 of the 1900 system
        NaiveDate::from_ymd_opt(1899, 12, 31)
    }
}

/// Fraction of a day elapsed at `time`, to millisecond precision
pub fn time_to_serial(time: NaiveTime) -> f64 {
    let ms = time.num_seconds_from_midnight() as i64 * 1000
        + (time.nanosecond() / 1_000_000) as i64;
    ms as f64 / MS_PER_DAY as f64
}

/// Convert a date-time to a serial number
///
/// Returns `None` for values before the epoch's first day.
pub fn datetime_to_serial(dt: NaiveDateTime, date_1904: bool) -> Option<f64> {
    let mut days = (dt.date() - epoch(date_1904)?).num_days();
    if date_1904 {
        if days < 0 {
            return None;
        }
    } else {
        if days < 1 {
            return None;
        }
        if days >= PHANTOM_LEAP_DAY {
            days += 1;
        }
    }
    Some(days as f64 + time_to_serial(dt.time()))
}

/// Convert a serial number back to a date-time
///
/// Returns `None` for negative or non-finite serials and for the phantom
/// 1900-02-29, which has no calendar counterpart.
pub fn serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let total_ms = (serial * MS_PER_DAY as f64).round() as i64;
    let mut days = total_ms.div_euclid(MS_PER_DAY);
    let ms = total_ms.rem_euclid(MS_PER_DAY);

    if !date_1904 {
        if days == PHANTOM_LEAP_DAY {
            return None;
        }
        if days > PHANTOM_LEAP_DAY {
            days -= 1;
        }
    }

    let date = epoch(date_1904)?.checked_add_signed(Duration::days(days))?;
    Some(date.and_time(NaiveTime::MIN) + Duration::milliseconds(ms))
}

/// Time-of-day part of a serial number
pub fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let ms = ((serial.fract() * MS_PER_DAY as f64).round() as i64).rem_euclid(MS_PER_DAY);
    let (time, _) = NaiveTime::MIN.overflowing_add_signed(Duration::milliseconds(ms));
    Some(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_1900_serials() {
        assert_eq!(datetime_to_serial(ymd(1900, 1, 1), false), Some(1.0));
        assert_eq!(datetime_to_serial(ymd(1900, 2, 28), false), Some(59.0));
        assert_eq!(datetime_to_serial(ymd(1900, 3, 1), false), Some(61.0));
        assert_eq!(datetime_to_serial(ymd(2000, 1, 1), false), Some(36526.0));
        assert_eq!(datetime_to_serial(ymd(1899, 12, 31), false), None);
    }

    #[test]
    fn test_1904_serials() {
        assert_eq!(datetime_to_serial(ymd(1904, 1, 1), true), Some(0.0));
        assert_eq!(datetime_to_serial(ymd(2000, 1, 1), true), Some(35064.0));
        assert_eq!(datetime_to_serial(ymd(1903, 12, 31), true), None);
    }

    #[test]
    fn test_time_fraction() {
        let dt = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(datetime_to_serial(dt, false), Some(36526.75));
        assert_eq!(serial_to_datetime(36526.75, false), Some(dt));
    }

    #[test]
    fn test_serial_to_datetime() {
        assert_eq!(serial_to_datetime(1.0, false), Some(ymd(1900, 1, 1)));
        assert_eq!(serial_to_datetime(59.0, false), Some(ymd(1900, 2, 28)));
        assert_eq!(serial_to_datetime(60.0, false), None);
        assert_eq!(serial_to_datetime(61.0, false), Some(ymd(1900, 3, 1)));
        assert_eq!(serial_to_datetime(35064.0, true), Some(ymd(2000, 1, 1)));
        assert_eq!(serial_to_datetime(-1.0, false), None);
    }

    #[test]
    fn test_serial_to_time() {
        assert_eq!(serial_to_time(0.5), NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(time_to_serial(NaiveTime::from_hms_opt(6, 0, 0).unwrap()), 0.25);
    }
}

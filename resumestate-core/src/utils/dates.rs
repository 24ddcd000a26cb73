//! Date helpers for data stamped in US Pacific time.
//!
//! Batch hosts run in UTC, so wall-clock strings from upstream systems have to
//! be localized to `US/Pacific` explicitly, with daylight saving applied per
//! date.

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{Tz, US::Pacific};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("no valid date format found for '{0}'")]
    NoValidFormat(String),

    #[error("epoch {0} is out of range")]
    EpochOutOfRange(String),
}

/// Formats accepted by [`date_str_pt_to_epoch`]
const PT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Pacific standard time, used for wall times skipped by the spring-forward jump
const PACIFIC_STANDARD_OFFSET_SECS: i32 = -8 * 3600;

/// Whole seconds since the epoch
pub fn datetime_to_epoch<T: TimeZone>(dt: &DateTime<T>) -> i64 {
    dt.timestamp()
}

/// Seconds since the epoch with sub-second precision
pub fn datetime_to_epoch_f64<T: TimeZone>(dt: &DateTime<T>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_micros()) / 1_000_000.0
}

/// Localize a naive wall time to Pacific.
///
/// An ambiguous time (the repeated hour in November) resolves to standard time;
/// a time skipped in March is read with the standard offset.
fn localize_pacific(naive: &NaiveDateTime) -> DateTime<Utc> {
    match Pacific.from_local_datetime(naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(_, standard) => standard.with_timezone(&Utc),
        LocalResult::None => {
            naive.and_utc() - Duration::seconds(i64::from(PACIFIC_STANDARD_OFFSET_SECS))
        }
    }
}

/// Parse `YYYY-mm-dd HH:MM:SS[.ffffff]` as Pacific wall time and return epoch seconds
pub fn date_str_pt_to_epoch(dt_string: &str) -> Result<i64, DateError> {
    PT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(dt_string, format).ok())
        .map(|naive| datetime_to_epoch(&localize_pacific(&naive)))
        .ok_or_else(|| DateError::NoValidFormat(dt_string.to_string()))
}

/// Render epoch seconds as a UTC timestamp with microseconds and a `Z` suffix
pub fn epoch_date_to_zulu(epoch: f64) -> Result<String, DateError> {
    let micros = (epoch * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() > i64::MAX as f64 {
        return Err(DateError::EpochOutOfRange(epoch.to_string()));
    }

    DateTime::<Utc>::from_timestamp_micros(micros as i64)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string())
        .ok_or_else(|| DateError::EpochOutOfRange(epoch.to_string()))
}

/// Epoch bounds of a Pacific calendar day given as `YYYY-mm-dd`.
///
/// A timestamp `t` falls on that day when `midnight <= t < next_midnight`.
/// Days on which daylight saving changes are 23 or 25 hours long.
pub fn naive_date_to_epoch_offset(date: &str) -> Result<(i64, i64), DateError> {
    let midnight = date_str_pt_to_epoch(&format!("{} 00:00:00", date))?;
    let next_midnight = 1 + date_str_pt_to_epoch(&format!("{} 23:59:59", date))?;
    Ok((midnight, next_midnight))
}

/// Current time in Pacific
pub fn now_pt() -> DateTime<Tz> {
    Utc::now().with_timezone(&Pacific)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summer_time_uses_daylight_offset() {
        // 2021-07-01 12:00 PDT == 19:00 UTC
        assert_eq!(date_str_pt_to_epoch("2021-07-01 12:00:00").unwrap(), 1625166000);
    }

    #[test]
    fn test_winter_time_uses_standard_offset() {
        // 2021-01-15 08:30 PST == 16:30 UTC
        assert_eq!(date_str_pt_to_epoch("2021-01-15 08:30:00").unwrap(), 1610728200);
    }

    #[test]
    fn test_fractional_seconds_accepted() {
        assert_eq!(
            date_str_pt_to_epoch("2021-01-15 08:30:00.250000").unwrap(),
            1610728200
        );
    }

    #[test]
    fn test_invalid_format() {
        assert_eq!(
            date_str_pt_to_epoch("01/15/2021").unwrap_err(),
            DateError::NoValidFormat("01/15/2021".to_string())
        );
    }

    #[test]
    fn test_ambiguous_hour_resolves_to_standard_time() {
        // 01:30 happens twice on 2020-11-01; standard time is 09:30 UTC
        assert_eq!(date_str_pt_to_epoch("2020-11-01 01:30:00").unwrap(), 1604223000);
    }

    #[test]
    fn test_skipped_hour_read_as_standard_time() {
        // 02:30 does not exist on 2020-03-08; read as PST it is 10:30 UTC
        assert_eq!(date_str_pt_to_epoch("2020-03-08 02:30:00").unwrap(), 1583663400);
    }

    #[test]
    fn test_fall_back_day_has_25_hours() {
        let (midnight, next_midnight) = naive_date_to_epoch_offset("2020-11-01").unwrap();
        assert_eq!(next_midnight - midnight, 25 * 3600);
    }

    #[test]
    fn test_spring_forward_day_has_23_hours() {
        let (midnight, next_midnight) = naive_date_to_epoch_offset("2020-03-08").unwrap();
        assert_eq!(next_midnight - midnight, 23 * 3600);
    }

    #[test]
    fn test_regular_day_has_24_hours() {
        let (midnight, next_midnight) = naive_date_to_epoch_offset("2021-07-01").unwrap();
        assert_eq!(midnight, 1625122800);
        assert_eq!(next_midnight - midnight, 24 * 3600);
    }

    #[test]
    fn test_epoch_date_to_zulu() {
        assert_eq!(
            epoch_date_to_zulu(1625166000.5).unwrap(),
            "2021-07-01T19:00:00.500000Z"
        );
        assert!(epoch_date_to_zulu(f64::NAN).is_err());
    }

    #[test]
    fn test_epoch_helpers() {
        let dt = DateTime::<Utc>::from_timestamp_micros(1_625_166_000_250_000).unwrap();
        assert_eq!(datetime_to_epoch(&dt), 1625166000);
        assert_eq!(datetime_to_epoch_f64(&dt), 1625166000.25);
    }

    #[test]
    fn test_now_pt_is_pacific() {
        assert_eq!(now_pt().timezone(), Pacific);
    }
}

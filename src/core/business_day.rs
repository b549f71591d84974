//! Business-day window resolution.
//!
//! A location whose bar closes after midnight has a business day that runs
//! from the calendar date's local midnight through the next day's close
//! time. Without a config the business day is the plain UTC calendar day.

use crate::core::timezone;
use crate::domain::model::{BusinessDayBounds, LocationTimeConfig};
use crate::utils::error::{CellarError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

fn next_label(label: NaiveDate) -> Result<NaiveDate> {
    label.succ_opt().ok_or(CellarError::InvalidRange {
        start: label,
        end: label,
    })
}

/// Resolves the authoritative UTC window for `label` under `config`.
///
/// Both endpoints are converted independently so a DST transition can affect
/// each on its own. If a pathological rule table ever yields `end <= start`,
/// the end is extended to `start + nominal duration` so the half-open
/// invariant holds unconditionally.
pub fn resolve_bounds(
    label: NaiveDate,
    config: Option<&LocationTimeConfig>,
) -> Result<BusinessDayBounds> {
    let zone = config.map(|c| c.timezone).unwrap_or(Tz::UTC);
    let close = config
        .map(|c| c.business_close_time)
        .unwrap_or(NaiveTime::MIN);
    resolve_bounds_in_zone(label, close, &zone)
}

pub(crate) fn resolve_bounds_in_zone(
    label: NaiveDate,
    close: NaiveTime,
    zone: &Tz,
) -> Result<BusinessDayBounds> {
    let next = next_label(label)?;
    let start = timezone::to_utc_instant(label, NaiveTime::MIN, zone);

    let (end, nominal) = if close == NaiveTime::MIN {
        (
            timezone::to_utc_instant(next, NaiveTime::MIN, zone),
            Duration::hours(24),
        )
    } else {
        let close_secs = close.signed_duration_since(NaiveTime::MIN);
        (
            timezone::to_utc_instant(next, close, zone),
            Duration::hours(24) + close_secs,
        )
    };

    let end = if end <= start { start + nominal } else { end };
    Ok(BusinessDayBounds { start, end })
}

/// The label of the business day whose window is open at `now`.
///
/// For cross-midnight locations this is yesterday's calendar date until the
/// close time passes; deriving it any other way (naive calendar "today")
/// misattributes late-night sales.
pub fn current_label(
    now: DateTime<Utc>,
    config: Option<&LocationTimeConfig>,
) -> Result<NaiveDate> {
    let zone = config.map(|c| c.timezone).unwrap_or(Tz::UTC);
    let local_today = now.with_timezone(&zone).date_naive();

    if let Some(yesterday) = local_today.pred_opt() {
        if resolve_bounds(yesterday, config)?.end > now {
            return Ok(yesterday);
        }
    }
    Ok(local_today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(zone: &str, close: &str) -> LocationTimeConfig {
        LocationTimeConfig {
            location_id: "loc1".to_string(),
            business_close_time: timezone::parse_time_of_day(close).unwrap(),
            timezone: timezone::parse_zone(zone).unwrap(),
        }
    }

    #[test]
    fn no_config_is_utc_calendar_day() {
        let bounds = resolve_bounds(date(2024, 6, 1), None).unwrap();
        assert_eq!(bounds.start, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(bounds.end, Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
        assert_eq!(bounds.duration(), Duration::hours(24));
    }

    #[test]
    fn midnight_close_spans_24h_absent_dst() {
        let cfg = config("America/New_York", "00:00");
        let bounds = resolve_bounds(date(2024, 6, 1), Some(&cfg)).unwrap();
        assert_eq!(bounds.duration(), Duration::hours(24));
    }

    #[test]
    fn midnight_close_spans_23h_on_spring_forward() {
        let cfg = config("America/New_York", "00:00");
        let bounds = resolve_bounds(date(2024, 3, 10), Some(&cfg)).unwrap();
        assert_eq!(bounds.duration(), Duration::hours(23));
    }

    #[test]
    fn midnight_close_spans_25h_on_fall_back() {
        let cfg = config("America/New_York", "00:00");
        let bounds = resolve_bounds(date(2024, 11, 3), Some(&cfg)).unwrap();
        assert_eq!(bounds.duration(), Duration::hours(25));
    }

    #[test]
    fn cross_midnight_close_spans_26h_absent_dst() {
        let cfg = config("America/New_York", "02:00");
        let bounds = resolve_bounds(date(2024, 6, 1), Some(&cfg)).unwrap();
        assert_eq!(bounds.duration(), Duration::hours(26));
    }

    #[test]
    fn spring_forward_night_skips_gap_at_close() {
        // Scenario: close 02:00, label 2024-03-09. The end lands on the
        // spring-forward night, so 02:00 resolves to 03:00 EDT = 07:00Z.
        let cfg = config("America/New_York", "02:00");
        let bounds = resolve_bounds(date(2024, 3, 9), Some(&cfg)).unwrap();
        assert_eq!(bounds.start, Utc.with_ymd_and_hms(2024, 3, 9, 5, 0, 0).unwrap());
        assert_eq!(bounds.end, Utc.with_ymd_and_hms(2024, 3, 10, 7, 0, 0).unwrap());
        // The gap-skip at the close endpoint offsets the lost DST hour, so
        // the window keeps its nominal 26h span.
        assert_eq!(bounds.duration(), Duration::hours(26));
    }

    #[test]
    fn calendar_day_windows_are_exactly_contiguous() {
        let cfg = config("America/New_York", "00:00");
        // Range crossing both 2024 US transitions.
        let mut label = date(2024, 3, 1);
        while label < date(2024, 11, 10) {
            let today = resolve_bounds(label, Some(&cfg)).unwrap();
            let tomorrow = resolve_bounds(label.succ_opt().unwrap(), Some(&cfg)).unwrap();
            assert_eq!(today.end, tomorrow.start, "discontinuity at {}", label);
            label = label.succ_opt().unwrap();
        }
    }

    #[test]
    fn current_label_is_yesterday_before_close() {
        let cfg = config("America/New_York", "02:00");
        // 2024-06-15 01:00 EDT = 05:00Z: still inside 2024-06-14's window.
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 5, 0, 0).unwrap();
        assert_eq!(current_label(now, Some(&cfg)).unwrap(), date(2024, 6, 14));
        // 03:00 EDT: past close, today's window.
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 7, 0, 0).unwrap();
        assert_eq!(current_label(now, Some(&cfg)).unwrap(), date(2024, 6, 15));
    }

    #[test]
    fn current_label_without_config_is_utc_date() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 23, 30, 0).unwrap();
        assert_eq!(current_label(now, None).unwrap(), date(2024, 6, 15));
    }

    #[test]
    fn window_contains_its_own_late_night() {
        let cfg = config("Europe/London", "03:00");
        let bounds = resolve_bounds(date(2024, 6, 14), Some(&cfg)).unwrap();
        // 02:30 local on the 15th belongs to the 14th's business day.
        let late_night = Utc.with_ymd_and_hms(2024, 6, 15, 1, 30, 0).unwrap();
        assert!(bounds.contains(late_night));
        assert!(!bounds.contains(bounds.end));
    }
}

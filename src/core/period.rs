//! Lazy expansion of a calendar label range into business-day windows.

use crate::core::business_day;
use crate::domain::model::{BusinessDayBounds, BusinessDayRange, LocationTimeConfig};
use crate::utils::error::{CellarError, Result};
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

/// Validates the range and returns a lazy iterator over its windows, one per
/// calendar label, ascending. The zone is resolved once here rather than per
/// label, so long ranges do not re-parse the rule table.
pub fn expand(
    range: &BusinessDayRange,
    config: Option<&LocationTimeConfig>,
) -> Result<PeriodIter> {
    if range.end_label < range.start_label {
        return Err(CellarError::InvalidRange {
            start: range.start_label,
            end: range.end_label,
        });
    }
    Ok(PeriodIter {
        next: Some(range.start_label),
        last: range.end_label,
        zone: config.map(|c| c.timezone).unwrap_or(Tz::UTC),
        close: config
            .map(|c| c.business_close_time)
            .unwrap_or(NaiveTime::MIN),
    })
}

/// Pure and restartable: cloning (or calling [`expand`] again) recomputes the
/// same sequence.
#[derive(Debug, Clone)]
pub struct PeriodIter {
    next: Option<NaiveDate>,
    last: NaiveDate,
    zone: Tz,
    close: NaiveTime,
}

impl Iterator for PeriodIter {
    type Item = BusinessDayBounds;

    fn next(&mut self) -> Option<Self::Item> {
        let label = self.next?;
        self.next = if label < self.last {
            label.succ_opt()
        } else {
            None
        };
        business_day::resolve_bounds_in_zone(label, self.close, &self.zone).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(next) => (self.last - next).num_days() as usize + 1,
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PeriodIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timezone;
    use chrono::{Duration, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> BusinessDayRange {
        BusinessDayRange {
            start_label: start,
            end_label: end,
        }
    }

    #[test]
    fn expands_inclusive_ascending_contiguous() {
        let windows: Vec<_> = expand(&range(date(2024, 6, 1), date(2024, 6, 3)), None)
            .unwrap()
            .collect();
        assert_eq!(windows.len(), 3);
        for pair in windows.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn single_label_range_yields_one_window() {
        let windows: Vec<_> = expand(&range(date(2024, 6, 1), date(2024, 6, 1)), None)
            .unwrap()
            .collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].duration(), Duration::hours(24));
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(matches!(
            expand(&range(date(2024, 6, 3), date(2024, 6, 1)), None),
            Err(CellarError::InvalidRange { .. })
        ));
    }

    #[test]
    fn is_restartable() {
        let iter = expand(&range(date(2024, 6, 1), date(2024, 6, 5)), None).unwrap();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn reports_exact_length() {
        let iter = expand(&range(date(2024, 6, 1), date(2024, 6, 30)), None).unwrap();
        assert_eq!(iter.len(), 30);
    }

    #[test]
    fn cross_midnight_windows_keep_26h_shape_across_range() {
        let cfg = LocationTimeConfig {
            location_id: "loc1".to_string(),
            business_close_time: timezone::parse_time_of_day("02:00").unwrap(),
            timezone: timezone::parse_zone("America/Chicago").unwrap(),
        };
        let windows: Vec<_> = expand(&range(date(2024, 6, 1), date(2024, 6, 7)), Some(&cfg))
            .unwrap()
            .collect();
        assert_eq!(windows.len(), 7);
        for w in &windows {
            assert_eq!(w.duration(), Duration::hours(26));
        }
    }
}

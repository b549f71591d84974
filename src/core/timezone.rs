//! Wall-clock to UTC conversion against IANA rule tables.
//!
//! DST edge policies, both fixed:
//! - a wall-clock time that falls in a spring-forward gap is shifted forward
//!   by the gap duration (interpreted with the pre-transition offset);
//! - an ambiguous fall-back time resolves to the later of the two instants.

use crate::utils::error::{CellarError, Result};
use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

// Widest step-back needed to find a valid wall clock before a transition.
// Covers multi-hour offset jumps and the historical full-day skips.
const MAX_GAP_PROBES: u32 = 50;
const GAP_PROBE_STEP_MINUTES: i64 = 30;

pub fn parse_zone(zone: &str) -> Result<Tz> {
    zone.parse::<Tz>().map_err(|_| CellarError::InvalidTimeZone {
        zone: zone.to_string(),
    })
}

/// Parses an `HH:MM` time of day. Seconds are not part of close-time
/// configuration.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| CellarError::InvalidTimeOfDay {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Converts a local wall-clock time on a calendar date to the UTC instant,
/// consulting the zone's offset rules for that specific date.
///
/// Total over valid inputs: the gap and ambiguity policies make every
/// wall-clock time resolvable.
pub fn to_utc_instant(date: NaiveDate, time: NaiveTime, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // Fall-back repeat: fixed tie-break to the post-transition offset.
        LocalResult::Ambiguous(_, later) => later.with_timezone(&Utc),
        // Spring-forward gap: interpret the nominal wall clock with the
        // offset in force just before the jump, which lands the instant
        // exactly one gap-width past the nominal time.
        LocalResult::None => {
            let mut probe = naive;
            for _ in 0..MAX_GAP_PROBES {
                probe -= Duration::minutes(GAP_PROBE_STEP_MINUTES);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    let offset_before = dt.offset().fix().local_minus_utc() as i64;
                    return Utc.from_utc_datetime(&(naive - Duration::seconds(offset_before)));
                }
            }
            // Rule table too degenerate to interpret; read the wall clock
            // as UTC rather than fail a pure conversion.
            tracing::warn!(zone = %tz, %naive, "could not resolve wall clock, treating as UTC");
            Utc.from_utc_datetime(&naive)
        }
    }
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Per-location close-of-business configuration.
///
/// Absence of a config means "calendar midnight-to-midnight, UTC". A close
/// time of 00:00 with a zone still means a plain calendar day, just in that
/// zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTimeConfig {
    pub location_id: String,
    pub business_close_time: NaiveTime,
    pub timezone: Tz,
}

/// A business day as an authoritative UTC half-open interval `[start, end)`.
///
/// Computed on demand, never persisted. `end > start` holds unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDayBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusinessDayBounds {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// An inclusive range of calendar labels to expand into business-day windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessDayRange {
    pub start_label: NaiveDate,
    pub end_label: NaiveDate,
}

/// Point-in-time alert aggregate for one location.
///
/// `critical_alerts` is the numeric view (for dashboards showing counts);
/// `has_critical` is the derived boolean (for badge-style UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub active_alerts: u32,
    pub critical_alerts: u32,
    pub has_critical: bool,
}

/// One inventory item's stock position, as reported by the inventory store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub current_quantity: f64,
    pub minimum_quantity: f64,
}

/// Variance-alert counts held by the external alert store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceCounts {
    pub active: u32,
    pub critical: u32,
}

/// A sale record fetched from a POS provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub external_id: String,
    pub item: String,
    pub quantity: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Idempotency key for one sync unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimToken {
    pub location_id: String,
    pub day: NaiveDate,
    pub provider_id: String,
}

impl ClaimToken {
    pub fn new(location_id: impl Into<String>, day: NaiveDate, provider_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            day,
            provider_id: provider_id.into(),
        }
    }
}

impl std::fmt::Display for ClaimToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.location_id, self.day, self.provider_id)
    }
}

/// Claim lifecycle. `Pending` is implicit: no record exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Running,
    Succeeded,
    Failed,
}

/// Ownership record over one sync unit of work.
///
/// Terminal records (`Succeeded`/`Failed`) are retained for idempotency
/// lookups; a `Running` record older than the abandonment timeout is
/// reclaimable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncClaim {
    pub token: ClaimToken,
    pub status: ClaimStatus,
    pub claimed_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncClaim {
    pub fn running(token: ClaimToken, now: DateTime<Utc>) -> Self {
        Self {
            token,
            status: ClaimStatus::Running,
            claimed_at: now,
            completed_at: None,
        }
    }
}

/// Outcome of one sync engine run, reported to the cron/CLI caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncReport {
    /// This run claimed the token, fetched and merged sales.
    Completed {
        token: ClaimToken,
        window: BusinessDayBounds,
        records: usize,
    },
    /// A previous run already succeeded for this token; no side effects.
    AlreadyCompleted { token: ClaimToken },
    /// Another worker holds a live claim; no action taken.
    InProgress { token: ClaimToken },
}

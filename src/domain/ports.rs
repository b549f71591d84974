use crate::domain::model::{
    BusinessDayBounds, ClaimToken, LocationTimeConfig, SaleRecord, StockLevel, SyncClaim,
    VarianceCounts,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Read-only lookup of a location's close-time configuration.
///
/// `Ok(None)` is a valid answer and means calendar midnight-to-midnight UTC.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    async fn time_config(&self, location_id: &str) -> Result<Option<LocationTimeConfig>>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn snapshot(&self, location_id: &str) -> Result<Vec<StockLevel>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn variance_counts(&self, location_id: &str) -> Result<VarianceCounts>;
}

/// Black-box POS sales fetch. Failures must be distinguishable as
/// transient vs permanent via [`crate::CellarError::is_retryable`].
#[async_trait]
pub trait SyncClient: Send + Sync {
    async fn fetch_sales(
        &self,
        location_id: &str,
        window: &BusinessDayBounds,
        provider_id: &str,
    ) -> Result<Vec<SaleRecord>>;
}

/// Write-through merge of fetched sales into the platform's stores.
#[async_trait]
pub trait SalesLedger: Send + Sync {
    async fn merge_sales(
        &self,
        location_id: &str,
        day: NaiveDate,
        sales: &[SaleRecord],
    ) -> Result<()>;
}

/// Precondition for a conditional claim write. The store must evaluate it
/// and apply the write as one atomic step, never as read-then-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimPrecondition {
    /// No record exists, or the record is `Failed`, or it is `Running` but
    /// was claimed strictly before `stale_before` (abandoned).
    Claimable { stale_before: DateTime<Utc> },
    /// The record is `Running` and was claimed at exactly this instant
    /// (ownership check for complete/fail transitions).
    RunningSince(DateTime<Utc>),
}

/// Result of a conditional claim write. `Rejected` carries the record that
/// won, so callers can report "in progress" vs "already completed".
#[derive(Debug, Clone, PartialEq)]
pub enum CasResult {
    Applied,
    Rejected(Option<SyncClaim>),
}

/// Persistence of claim records. The physical store is external; this port
/// defines the record layout and the atomic transition primitive.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn compare_and_swap(
        &self,
        token: &ClaimToken,
        precondition: ClaimPrecondition,
        next: SyncClaim,
    ) -> Result<CasResult>;

    async fn get(&self, token: &ClaimToken) -> Result<Option<SyncClaim>>;
}

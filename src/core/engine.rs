//! One sync run, end to end: resolve the open business-day window, claim
//! the token, fetch sales under a timeout, merge, complete.

use crate::core::business_day;
use crate::core::claims::{ClaimOutcome, SyncClaimCoordinator};
use crate::domain::model::{ClaimToken, SyncReport};
use crate::domain::ports::{ClaimStore, LocationDirectory, SalesLedger, SyncClient};
use crate::utils::error::{CellarError, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SyncEngine<D, C, L, S>
where
    D: LocationDirectory,
    C: SyncClient,
    L: SalesLedger,
    S: ClaimStore,
{
    directory: D,
    client: C,
    ledger: L,
    coordinator: SyncClaimCoordinator<S>,
    fetch_timeout: Duration,
}

impl<D, C, L, S> SyncEngine<D, C, L, S>
where
    D: LocationDirectory,
    C: SyncClient,
    L: SalesLedger,
    S: ClaimStore,
{
    pub fn new(directory: D, client: C, ledger: L, coordinator: SyncClaimCoordinator<S>) -> Self {
        Self {
            directory,
            client,
            ledger,
            coordinator,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn coordinator(&self) -> &SyncClaimCoordinator<S> {
        &self.coordinator
    }

    /// Runs one sync for the business day currently open at `now`.
    ///
    /// The day label comes from the open window's start, so a 01:30 cron
    /// fire at a 02:00-close location syncs yesterday's label. Exactly one
    /// of the possible outcomes happens: the claim is taken and driven to a
    /// terminal state, or the run reports why it did nothing.
    pub async fn run_current(
        &self,
        location_id: &str,
        provider_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SyncReport> {
        let config = self.directory.time_config(location_id).await?;
        let label = business_day::current_label(now, config.as_ref())?;
        let window = business_day::resolve_bounds(label, config.as_ref())?;
        let token = ClaimToken::new(location_id, label, provider_id);

        tracing::info!(
            %token,
            start = %window.start,
            end = %window.end,
            "starting sync run"
        );

        let claimed_at = match self.coordinator.claim(&token, now).await? {
            ClaimOutcome::Acquired { claimed_at } => claimed_at,
            ClaimOutcome::AlreadyCompleted { .. } => {
                tracing::info!(%token, "already synced, skipping");
                return Ok(SyncReport::AlreadyCompleted { token });
            }
            ClaimOutcome::InProgress { since } => {
                tracing::info!(%token, %since, "sync in progress elsewhere, skipping");
                return Ok(SyncReport::InProgress { token });
            }
        };

        // From here the claim is ours: every exit path below must leave it
        // in a terminal state.
        let sales = match tokio::time::timeout(
            self.fetch_timeout,
            self.client.fetch_sales(location_id, &window, provider_id),
        )
        .await
        {
            Ok(Ok(sales)) => sales,
            Ok(Err(e)) => {
                self.coordinator.fail(&token, claimed_at, Utc::now()).await?;
                return Err(e);
            }
            Err(_elapsed) => {
                self.coordinator.fail(&token, claimed_at, Utc::now()).await?;
                return Err(CellarError::FetchFailed {
                    provider: provider_id.to_string(),
                    retryable: true,
                    message: format!("fetch timed out after {:?}", self.fetch_timeout),
                });
            }
        };

        if let Err(e) = self.ledger.merge_sales(location_id, label, &sales).await {
            self.coordinator.fail(&token, claimed_at, Utc::now()).await?;
            return Err(e);
        }

        self.coordinator
            .complete(&token, claimed_at, Utc::now())
            .await?;

        Ok(SyncReport::Completed {
            token,
            window,
            records: sales.len(),
        })
    }
}

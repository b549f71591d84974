//! Claim coordination for periodic sync work.
//!
//! Every (location, business day, provider) triple is a unit of work that
//! must execute its side effects at most once per successful completion.
//! Ownership is taken with a single atomic conditional write against the
//! claim store, never a read-then-write, so racing workers cannot both
//! believe they hold the claim.

use crate::domain::model::{ClaimStatus, ClaimToken, SyncClaim};
use crate::domain::ports::{CasResult, ClaimPrecondition, ClaimStore};
use crate::utils::error::{CellarError, Result};
use chrono::{DateTime, Duration, Utc};

/// Outcome of a claim attempt. Conflicts are normal reportable outcomes,
/// not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller now owns the claim and must finish with `complete` or
    /// `fail`.
    Acquired { claimed_at: DateTime<Utc> },
    /// Another worker holds a live `Running` claim.
    InProgress { since: DateTime<Utc> },
    /// The token already reached `Succeeded`; idempotent short-circuit.
    AlreadyCompleted {
        completed_at: Option<DateTime<Utc>>,
    },
}

pub struct SyncClaimCoordinator<S: ClaimStore> {
    store: S,
    abandon_after: Duration,
}

impl<S: ClaimStore> SyncClaimCoordinator<S> {
    /// Coordinator with the default 10 minute abandonment timeout.
    pub fn new(store: S) -> Self {
        Self::with_abandon_after(store, Duration::minutes(10))
    }

    pub fn with_abandon_after(store: S, abandon_after: Duration) -> Self {
        Self {
            store,
            abandon_after,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Attempts to take ownership of `token` at `now`.
    ///
    /// Succeeds when no record exists, the previous attempt failed, or a
    /// `Running` record is older than the abandonment timeout (the previous
    /// owner is treated as gone and the claim is taken over directly).
    pub async fn claim(&self, token: &ClaimToken, now: DateTime<Utc>) -> Result<ClaimOutcome> {
        let stale_before = now - self.abandon_after;
        let next = SyncClaim::running(token.clone(), now);

        match self
            .store
            .compare_and_swap(token, ClaimPrecondition::Claimable { stale_before }, next)
            .await?
        {
            CasResult::Applied => {
                tracing::info!(%token, "claimed sync work");
                Ok(ClaimOutcome::Acquired { claimed_at: now })
            }
            CasResult::Rejected(Some(current)) => match current.status {
                ClaimStatus::Succeeded => Ok(ClaimOutcome::AlreadyCompleted {
                    completed_at: current.completed_at,
                }),
                ClaimStatus::Running => {
                    tracing::debug!(%token, since = %current.claimed_at, "claim held elsewhere");
                    Ok(ClaimOutcome::InProgress {
                        since: current.claimed_at,
                    })
                }
                // A Failed record satisfies the precondition; losing the
                // CAS against one means a concurrent retry just won.
                ClaimStatus::Failed => Ok(ClaimOutcome::InProgress {
                    since: current.claimed_at,
                }),
            },
            CasResult::Rejected(None) => {
                // Absent satisfies the precondition; a concurrent claimer
                // won and the store could not return its record.
                Ok(ClaimOutcome::InProgress { since: now })
            }
        }
    }

    /// Marks a held claim `Succeeded`. Terminal: later `claim` calls for
    /// this token short-circuit without side effects.
    pub async fn complete(
        &self,
        token: &ClaimToken,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let next = SyncClaim {
            token: token.clone(),
            status: ClaimStatus::Succeeded,
            claimed_at,
            completed_at: Some(now),
        };
        match self
            .store
            .compare_and_swap(token, ClaimPrecondition::RunningSince(claimed_at), next)
            .await?
        {
            CasResult::Applied => {
                tracing::info!(%token, "sync work completed");
                Ok(())
            }
            CasResult::Rejected(_) => Err(CellarError::ClaimLost {
                token: token.to_string(),
            }),
        }
    }

    /// Marks a held claim `Failed`, leaving the token eligible for a fresh
    /// `claim`. Losing the record to a reclaimer in the meantime is not an
    /// error; the reclaimer owns the outcome now.
    pub async fn fail(
        &self,
        token: &ClaimToken,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let next = SyncClaim {
            token: token.clone(),
            status: ClaimStatus::Failed,
            claimed_at,
            completed_at: Some(now),
        };
        match self
            .store
            .compare_and_swap(token, ClaimPrecondition::RunningSince(claimed_at), next)
            .await?
        {
            CasResult::Applied => {
                tracing::warn!(%token, "sync work failed, token retryable");
                Ok(())
            }
            CasResult::Rejected(_) => {
                tracing::warn!(%token, "claim already reclaimed while failing it");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryClaimStore;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Arc;

    fn token() -> ClaimToken {
        ClaimToken::new(
            "loc1",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            "square",
        )
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, h, m, 0).unwrap()
    }

    fn coordinator() -> SyncClaimCoordinator<MemoryClaimStore> {
        SyncClaimCoordinator::new(MemoryClaimStore::new())
    }

    #[tokio::test]
    async fn claim_then_complete_is_terminal() {
        let coord = coordinator();
        let t = token();

        let outcome = coord.claim(&t, at(9, 0)).await.unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Acquired {
                claimed_at: at(9, 0)
            }
        );
        coord.complete(&t, at(9, 0), at(9, 1)).await.unwrap();

        // Idempotent short-circuit on every later attempt.
        let outcome = coord.claim(&t, at(9, 5)).await.unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::AlreadyCompleted {
                completed_at: Some(at(9, 1))
            }
        );
        let outcome = coord.claim(&t, at(23, 0)).await.unwrap();
        assert!(matches!(outcome, ClaimOutcome::AlreadyCompleted { .. }));
    }

    #[tokio::test]
    async fn live_running_claim_conflicts() {
        let coord = coordinator();
        let t = token();

        coord.claim(&t, at(9, 0)).await.unwrap();
        let outcome = coord.claim(&t, at(9, 5)).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::InProgress { since: at(9, 0) });
    }

    #[tokio::test]
    async fn stale_running_claim_is_reclaimable() {
        let coord = coordinator();
        let t = token();

        coord.claim(&t, at(9, 0)).await.unwrap();
        // Past the 10 minute abandonment timeout.
        let outcome = coord.claim(&t, at(9, 11)).await.unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Acquired {
                claimed_at: at(9, 11)
            }
        );
    }

    #[tokio::test]
    async fn failed_claim_is_retryable() {
        let coord = coordinator();
        let t = token();

        coord.claim(&t, at(9, 0)).await.unwrap();
        coord.fail(&t, at(9, 0), at(9, 1)).await.unwrap();

        let outcome = coord.claim(&t, at(9, 2)).await.unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Acquired {
                claimed_at: at(9, 2)
            }
        );
    }

    #[tokio::test]
    async fn completing_a_reclaimed_claim_reports_loss() {
        let coord = coordinator();
        let t = token();

        coord.claim(&t, at(9, 0)).await.unwrap();
        // Another worker reclaims after abandonment.
        coord.claim(&t, at(9, 11)).await.unwrap();

        let err = coord.complete(&t, at(9, 0), at(9, 12)).await.unwrap_err();
        assert!(matches!(err, CellarError::ClaimLost { .. }));
    }

    #[tokio::test]
    async fn failing_a_reclaimed_claim_is_a_noop() {
        let coord = coordinator();
        let t = token();

        coord.claim(&t, at(9, 0)).await.unwrap();
        coord.claim(&t, at(9, 11)).await.unwrap();

        // The first owner's fail must not clobber the reclaimer.
        coord.fail(&t, at(9, 0), at(9, 12)).await.unwrap();
        let current = coord.store().get(&t).await.unwrap().unwrap();
        assert_eq!(current.status, ClaimStatus::Running);
        assert_eq!(current.claimed_at, at(9, 11));
    }

    #[tokio::test]
    async fn concurrent_claims_admit_exactly_one_owner() {
        let coord = Arc::new(coordinator());
        let t = token();

        let (a, b) = tokio::join!(coord.claim(&t, at(9, 0)), coord.claim(&t, at(9, 0)));
        let outcomes = [a.unwrap(), b.unwrap()];
        let acquired = outcomes
            .iter()
            .filter(|o| matches!(o, ClaimOutcome::Acquired { .. }))
            .count();
        let conflicted = outcomes
            .iter()
            .filter(|o| matches!(o, ClaimOutcome::InProgress { .. }))
            .count();
        assert_eq!(acquired, 1);
        assert_eq!(conflicted, 1);
    }
}

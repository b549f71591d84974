//! In-memory claim store with genuinely atomic conditional writes.
//!
//! Suitable for single-process deployments and as the test double;
//! multi-process deployments implement the same port against a database
//! with a conditional UPDATE.

use crate::domain::model::{ClaimStatus, ClaimToken, SyncClaim};
use crate::domain::ports::{CasResult, ClaimPrecondition, ClaimStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryClaimStore {
    claims: Mutex<HashMap<ClaimToken, SyncClaim>>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn precondition_holds(
    current: Option<&SyncClaim>,
    precondition: &ClaimPrecondition,
) -> bool {
    match precondition {
        ClaimPrecondition::Claimable { stale_before } => match current {
            None => true,
            Some(claim) => match claim.status {
                ClaimStatus::Failed => true,
                ClaimStatus::Running => claim.claimed_at < *stale_before,
                ClaimStatus::Succeeded => false,
            },
        },
        ClaimPrecondition::RunningSince(claimed_at) => matches!(
            current,
            Some(claim) if claim.status == ClaimStatus::Running && claim.claimed_at == *claimed_at
        ),
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn compare_and_swap(
        &self,
        token: &ClaimToken,
        precondition: ClaimPrecondition,
        next: SyncClaim,
    ) -> Result<CasResult> {
        let mut claims = self.claims.lock().unwrap_or_else(|e| e.into_inner());
        let current = claims.get(token);
        if precondition_holds(current, &precondition) {
            claims.insert(token.clone(), next);
            Ok(CasResult::Applied)
        } else {
            Ok(CasResult::Rejected(current.cloned()))
        }
    }

    async fn get(&self, token: &ClaimToken) -> Result<Option<SyncClaim>> {
        let claims = self.claims.lock().unwrap_or_else(|e| e.into_inner());
        Ok(claims.get(token).cloned())
    }
}

//! JSON-file-backed claim store.
//!
//! Keeps claim records across CLI invocations in a single state file.
//! Conditional writes are atomic within the process (one mutex guards the
//! whole read-modify-write); cross-process deployments need a store with
//! real conditional writes.

use crate::adapters::memory::precondition_holds;
use crate::domain::model::{ClaimToken, SyncClaim};
use crate::domain::ports::{CasResult, ClaimPrecondition, ClaimStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct JsonClaimStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonClaimStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<HashMap<String, SyncClaim>> {
        if !Path::new(&self.path).exists() {
            return Ok(HashMap::new());
        }
        let data = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn save(&self, claims: &HashMap<String, SyncClaim>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(claims)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[async_trait]
impl ClaimStore for JsonClaimStore {
    async fn compare_and_swap(
        &self,
        token: &ClaimToken,
        precondition: ClaimPrecondition,
        next: SyncClaim,
    ) -> Result<CasResult> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let mut claims = self.load()?;
        let key = token.to_string();
        if precondition_holds(claims.get(&key), &precondition) {
            claims.insert(key, next);
            self.save(&claims)?;
            Ok(CasResult::Applied)
        } else {
            Ok(CasResult::Rejected(claims.get(&key).cloned()))
        }
    }

    async fn get(&self, token: &ClaimToken) -> Result<Option<SyncClaim>> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.get(&token.to_string()).cloned())
    }
}

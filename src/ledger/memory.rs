// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! In-process ledger.
//!
//! Backs local development and the test suite. Version numbers come from a
//! single monotonic counter so records created at different times always
//! sort deterministically by version.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Ledger, LedgerError, PointerRecord};

#[derive(Default)]
struct State {
    epoch: u64,
    next_version: u64,
    records: Vec<PointerRecord>,
}

/// In-memory pointer-record ledger.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current epoch (test control).
    pub async fn set_epoch(&self, epoch: u64) {
        self.state.lock().await.epoch = epoch;
    }

    /// Advance the current epoch by `delta`.
    pub async fn advance_epoch(&self, delta: u64) {
        self.state.lock().await.epoch += delta;
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn current_epoch(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.epoch)
    }

    async fn pointers_owned_by(&self, owner: &str) -> Result<Vec<PointerRecord>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect())
    }

    async fn create_pointer(
        &self,
        owner: &str,
        blob_id: &str,
        policy_id: &str,
    ) -> Result<PointerRecord, LedgerError> {
        let mut state = self.state.lock().await;
        state.next_version += 1;
        let now = chrono::Utc::now().timestamp_millis();
        let record = PointerRecord {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            content_blob_id: blob_id.to_string(),
            policy_id: policy_id.to_string(),
            entry_count: 0,
            version: state.next_version,
            created_at: now,
            updated_at: now,
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update_pointer(
        &self,
        pointer_id: &str,
        blob_id: &str,
        entry_count: u64,
    ) -> Result<PointerRecord, LedgerError> {
        let mut state = self.state.lock().await;
        state.next_version += 1;
        let version = state.next_version;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == pointer_id)
            .ok_or_else(|| LedgerError::NotFound(pointer_id.to_string()))?;
        record.content_blob_id = blob_id.to_string();
        record.entry_count = entry_count;
        record.version = version;
        record.updated_at = chrono::Utc::now().timestamp_millis();
        Ok(record.clone())
    }

    async fn destroy_pointer(&self, pointer_id: &str) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        let before = state.records.len();
        state.records.retain(|r| r.id != pointer_id);
        if state.records.len() == before {
            return Err(LedgerError::NotFound(pointer_id.to_string()));
        }
        Ok(())
    }
}

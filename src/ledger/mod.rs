// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Pointer-record ledger interface.
//!
//! The ledger holds one small record per vault: a reference to the current
//! encrypted blob plus a version counter. The content itself never touches
//! the ledger. Time is expressed in ledger epochs, a monotonically
//! increasing logical counter.

mod http;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpLedger;
pub use memory::MemoryLedger;

/// On-ledger pointer record for a vault.
///
/// Every mutation replaces `content_blob_id` and bumps `version`; the
/// record is the single source of truth for the current vault version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerRecord {
    /// Ledger object id.
    pub id: String,
    /// Owning identity (account address).
    pub owner: String,
    /// Blob-store id of the current encrypted content.
    pub content_blob_id: String,
    /// Encryption policy recorded at creation.
    pub policy_id: String,
    /// Number of entries in the referenced content.
    pub entry_count: u64,
    /// Record version, incremented on every update.
    pub version: u64,
    /// Creation timestamp, milliseconds.
    pub created_at: i64,
    /// Last-update timestamp, milliseconds.
    pub updated_at: i64,
}

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger request failed: {0}")]
    Request(String),

    #[error("ledger response was invalid: {0}")]
    InvalidResponse(String),

    #[error("pointer record not found: {0}")]
    NotFound(String),
}

/// Ledger operations needed by the session and vault engines.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current ledger epoch.
    async fn current_epoch(&self) -> Result<u64, LedgerError>;

    /// All pointer records owned by `owner`.
    async fn pointers_owned_by(&self, owner: &str) -> Result<Vec<PointerRecord>, LedgerError>;

    /// Create a new pointer record referencing `blob_id`.
    async fn create_pointer(
        &self,
        owner: &str,
        blob_id: &str,
        policy_id: &str,
    ) -> Result<PointerRecord, LedgerError>;

    /// Point an existing record at a new blob.
    ///
    /// The update carries no expected-prior-version; concurrent updates are
    /// last-write-wins on the ledger.
    async fn update_pointer(
        &self,
        pointer_id: &str,
        blob_id: &str,
        entry_count: u64,
    ) -> Result<PointerRecord, LedgerError>;

    /// Destroy a pointer record.
    async fn destroy_pointer(&self, pointer_id: &str) -> Result<(), LedgerError>;
}

// Lets one ledger instance be shared between the session and vault engines.
#[async_trait]
impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    async fn current_epoch(&self) -> Result<u64, LedgerError> {
        (**self).current_epoch().await
    }

    async fn pointers_owned_by(&self, owner: &str) -> Result<Vec<PointerRecord>, LedgerError> {
        (**self).pointers_owned_by(owner).await
    }

    async fn create_pointer(
        &self,
        owner: &str,
        blob_id: &str,
        policy_id: &str,
    ) -> Result<PointerRecord, LedgerError> {
        (**self).create_pointer(owner, blob_id, policy_id).await
    }

    async fn update_pointer(
        &self,
        pointer_id: &str,
        blob_id: &str,
        entry_count: u64,
    ) -> Result<PointerRecord, LedgerError> {
        (**self).update_pointer(pointer_id, blob_id, entry_count).await
    }

    async fn destroy_pointer(&self, pointer_id: &str) -> Result<(), LedgerError> {
        (**self).destroy_pointer(pointer_id).await
    }
}

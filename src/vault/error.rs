// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

use crate::blobstore::BlobStoreError;
use crate::codec::CodecError;
use crate::ledger::LedgerError;

/// Errors from vault operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// No authenticated session is installed; log in first.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The account has no vault yet; create one first.
    #[error("no vault exists for this account")]
    NoVault,

    /// No entry with the given id exists in the vault.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The blob decrypted (or parsed) into something that is not vault
    /// content.
    #[error("vault content could not be read: {0}")]
    Unreadable(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Blob(#[from] BlobStoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("vault content serialization failed: {0}")]
    Serialize(String),
}

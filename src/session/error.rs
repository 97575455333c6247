// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Session engine errors.

use crate::config::ConfigError;
use crate::ledger::LedgerError;

use super::store::SessionStoreError;

/// Errors surfaced by the federated login flow.
///
/// None of these are retried automatically. Client-side state errors
/// (`InvalidToken`, `SessionMissing`) are recoverable by restarting the
/// login flow; service errors are surfaced so the user can retry the whole
/// action.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Provider credentials are unset. Fatal, raised before any network call.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The identity token could not be parsed.
    #[error("identity token is invalid: {0}")]
    InvalidToken(String),

    /// The ephemeral login state was lost between redirect and callback
    /// (e.g. the browser session was cleared).
    #[error("login session data is missing: {0}")]
    SessionMissing(&'static str),

    /// The secret-issuance service returned a non-success response.
    #[error("salt service request failed: {0}")]
    SaltService(String),

    /// The proof service returned a non-success response.
    #[error("proof service request failed: {0}")]
    ProofService(String),

    /// A transaction signature was requested but the session carries no proof.
    #[error("no correctness proof available for this session")]
    MissingProof,

    /// Ephemeral key generation failed.
    #[error("ephemeral key generation failed")]
    KeyGeneration,

    /// Reading the current epoch from the ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Session persistence failed.
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Session data types.

use serde::{Deserialize, Serialize};

/// One in-flight login attempt.
///
/// Exists only client-side, scoped to the current browser session. Created
/// by `begin_login`, consumed exactly once by `complete_login`, and
/// discarded on logout or on successful promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemeralSession {
    /// PKCS#8 document of the ephemeral Ed25519 keypair.
    pub keypair_pkcs8: Vec<u8>,
    /// Raw ephemeral public key bytes.
    pub public_key: Vec<u8>,
    /// Login randomness (decimal string, unique per attempt).
    pub randomness: String,
    /// Absolute expiry epoch this attempt was bound to.
    pub max_epoch: u64,
    /// Nonce embedded in the authorization redirect.
    pub nonce: String,
}

/// A durable, time-bounded authorization produced by a completed login.
///
/// Replaced wholesale on re-login; destroyed on logout or once the ledger
/// epoch reaches `max_epoch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedSession {
    /// Opaque signed identity assertion from the provider.
    pub identity_token: String,
    /// Derived secret issued by the salt service.
    pub salt: String,
    /// Account address derived from the token and salt.
    pub address: String,
    /// Absolute expiry, in ledger epochs (not wall-clock time).
    pub max_epoch: u64,
    /// Opaque correctness proof tied to the token, salt, and ephemeral key.
    pub proof: serde_json::Value,
    /// Email claim, when the provider supplied one.
    pub email: Option<String>,
    /// Promotion timestamp, milliseconds since the Unix epoch.
    pub logged_in_at: i64,
}

impl AuthenticatedSession {
    /// A session is valid iff all required fields are present and the
    /// current ledger epoch has not reached `max_epoch`.
    pub fn is_valid_at(&self, current_epoch: u64) -> bool {
        self.is_complete() && current_epoch < self.max_epoch
    }

    /// Required-field completeness check.
    pub fn is_complete(&self) -> bool {
        !self.identity_token.is_empty()
            && !self.salt.is_empty()
            && !self.address.is_empty()
            && !self.proof.is_null()
    }
}

/// Observable login state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// No session and no login in flight.
    Unauthenticated,
    /// A login redirect was issued and the callback has not arrived yet.
    AwaitingCallback,
    /// A valid session is installed.
    Authenticated,
}

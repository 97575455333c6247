// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Federated session engine and ephemeral key material.

pub mod claims;
pub mod engine;
pub mod keys;
mod error;
mod model;
pub mod services;
pub mod store;

pub use claims::{extract_claims, Audience, IdClaims};
pub use engine::{derive_address, LoginRequest, SessionEngine, TransactionAuthorization};
pub use error::SessionError;
pub use model::{AuthenticatedSession, EphemeralSession, LoginState};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreError};

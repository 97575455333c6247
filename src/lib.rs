// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Client library for a federated-login encrypted password vault.
//!
//! Three subsystems compose the client:
//!
//! * [`session`] — federated login with ephemeral keys: builds the provider
//!   authorize URL, completes the callback with salt and proof services,
//!   and derives the account address from the identity token.
//! * [`vault`] — versioned encrypted storage: content is sealed client-side
//!   ([`codec`]), stored in a content-addressed blob store ([`blobstore`]),
//!   and referenced by a pointer record on a ledger ([`ledger`]).
//! * [`relay`] — mirrors credentials into a secondary context (a companion
//!   extension or helper process) over fallback transports.
//!
//! The [`state::SessionContext`] handle ties the session and vault engines
//! together: the session engine installs the authenticated session, the
//! vault engine reads it.

pub mod blobstore;
pub mod codec;
pub mod config;
pub mod ledger;
pub mod relay;
pub mod session;
pub mod state;
pub mod vault;

pub use config::{AuthConfig, BlobConfig, ConfigError};
pub use session::{AuthenticatedSession, LoginState, SessionEngine, SessionError};
pub use state::SessionContext;
pub use vault::{EntryDraft, EntryPatch, PasswordEntry, VaultContent, VaultEngine, VaultError};

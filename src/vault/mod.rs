// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Encrypted vault: content model, engine, and errors.

mod engine;
mod error;
mod model;

pub use engine::VaultEngine;
pub use error::VaultError;
pub use model::{
    EntryDraft, EntryPatch, PasswordEntry, VaultContent, VaultMetadata, CONTENT_FORMAT_VERSION,
};

/// The on-ledger record a vault hangs off.
pub use crate::ledger::PointerRecord as VaultPointer;

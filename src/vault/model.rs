// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Vault content data model.
//!
//! `VaultContent` is the plaintext form of the blob: a format version, the
//! entry list, and self-describing metadata. Field names follow the wire
//! format of existing vault blobs.

use serde::{Deserialize, Serialize};

use crate::relay::RelayEntry;

/// Format version written into new vault content.
pub const CONTENT_FORMAT_VERSION: u32 = 1;

/// One stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordEntry {
    pub id: String,
    /// Display label, usually the service name.
    pub site: String,
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp, milliseconds.
    pub created_at: i64,
    /// Last-modification timestamp, milliseconds.
    pub updated_at: i64,
}

impl PasswordEntry {
    /// Materialize a draft into a full entry with a fresh id and timestamps.
    pub fn from_draft(draft: EntryDraft) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            site: draft.site,
            url: draft.url,
            username: draft.username,
            password: draft.password,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Projection of this entry for the relay wire.
    pub fn to_relay(&self) -> RelayEntry {
        RelayEntry {
            id: self.id.clone(),
            site: self.site.clone(),
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Input for creating a new entry.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub site: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub notes: Option<String>,
}

/// Partial update for an existing entry; `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub site: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub notes: Option<String>,
}

impl EntryPatch {
    /// Apply the patch in place and refresh the modification timestamp.
    pub fn apply(self, entry: &mut PasswordEntry) {
        if let Some(site) = self.site {
            entry.site = site;
        }
        if let Some(url) = self.url {
            entry.url = url;
        }
        if let Some(username) = self.username {
            entry.username = username;
        }
        if let Some(password) = self.password {
            entry.password = password;
        }
        if let Some(notes) = self.notes {
            entry.notes = Some(notes);
        }
        entry.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

/// Self-describing metadata stored alongside the entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultMetadata {
    pub total_entries: u64,
    /// When this content was last written, milliseconds.
    pub last_synced_at: i64,
}

/// Plaintext form of the vault blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultContent {
    pub version: u32,
    pub entries: Vec<PasswordEntry>,
    pub metadata: VaultMetadata,
}

impl VaultContent {
    pub fn empty() -> Self {
        Self {
            version: CONTENT_FORMAT_VERSION,
            entries: Vec::new(),
            metadata: VaultMetadata {
                total_entries: 0,
                last_synced_at: chrono::Utc::now().timestamp_millis(),
            },
        }
    }

    /// Whether the metadata count agrees with the entry list.
    pub fn is_consistent(&self) -> bool {
        self.metadata.total_entries as usize == self.entries.len()
    }

    /// Refresh the metadata after mutating the entry list.
    pub fn touch(&mut self) {
        self.metadata.total_entries = self.entries.len() as u64;
        self.metadata.last_synced_at = chrono::Utc::now().timestamp_millis();
    }

    /// Relay projection of every entry.
    pub fn relay_entries(&self) -> Vec<RelayEntry> {
        self.entries.iter().map(PasswordEntry::to_relay).collect()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Secondary-context snapshot store.
//!
//! The receiving side of the relay keeps a full replacement snapshot of the
//! credential list. There is no merging: every `syncPasswords` message
//! replaces whatever was held before, so the store can never drift ahead of
//! the primary.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

use super::transport::{AddressedMessage, BroadcastMessage};
use super::{RelayEntry, SyncAck, SyncEnvelope};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Replace-all snapshot of relayed credentials.
#[derive(Default)]
pub struct SnapshotStore {
    entries: Mutex<Vec<RelayEntry>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one wire message and produce the acknowledgement.
    ///
    /// Anything other than a sync or clear is answered with a rejection; the
    /// snapshot is left untouched in that case.
    pub fn apply(&self, message: &serde_json::Value) -> SyncAck {
        match serde_json::from_value::<SyncEnvelope>(message.clone()) {
            Ok(SyncEnvelope::SyncPasswords { passwords }) => {
                let count = passwords.len() as u64;
                *lock(&self.entries) = passwords;
                debug!(count, "snapshot replaced");
                SyncAck::ok(count)
            }
            Ok(SyncEnvelope::ClearPasswords) => {
                lock(&self.entries).clear();
                debug!("snapshot cleared");
                SyncAck::ok(0)
            }
            _ => SyncAck::rejected("Unknown action"),
        }
    }

    /// Current snapshot.
    pub fn entries(&self) -> Vec<RelayEntry> {
        lock(&self.entries).clone()
    }

    /// Entries whose site matches `host` by domain containment.
    ///
    /// A stored site matches when either string contains the other, so
    /// `accounts.example.com` finds an entry saved for `example.com` and
    /// vice versa. Matching is case-insensitive.
    pub fn find_for_site(&self, host: &str) -> Vec<RelayEntry> {
        let host = host.to_ascii_lowercase();
        if host.is_empty() {
            return Vec::new();
        }
        lock(&self.entries)
            .iter()
            .filter(|entry| {
                let site = site_host(entry).to_ascii_lowercase();
                !site.is_empty() && (site.contains(&host) || host.contains(&site))
            })
            .cloned()
            .collect()
    }

    /// Build the fill response for a page on `host`.
    pub fn fill_for(&self, host: &str) -> SyncEnvelope {
        match self.find_for_site(host).into_iter().next() {
            Some(entry) => SyncEnvelope::FillPassword {
                username: entry.username,
                password: entry.password,
            },
            None => SyncEnvelope::ShowNotification {
                message: "No password found for this site".to_string(),
            },
        }
    }
}

/// Host component of an entry's site, falling back to the raw site string
/// when it is not a full URL.
fn site_host(entry: &RelayEntry) -> String {
    let source = if entry.url.is_empty() {
        &entry.site
    } else {
        &entry.url
    };
    url::Url::parse(source)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| entry.site.clone())
}

/// Serve a direct-transport channel from a snapshot store.
///
/// Runs until the sending side closes the channel.
pub fn attach(
    store: Arc<SnapshotStore>,
    mut rx: mpsc::Receiver<AddressedMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let ack = store.apply(&message.payload);
            // The sender may have stopped waiting; nothing to do then.
            let _ = message.reply.send(ack);
        }
    })
}

/// Serve a broadcast bus from a snapshot store, accepting only messages
/// tagged with `origin`.
pub fn attach_broadcast(
    store: Arc<SnapshotStore>,
    mut rx: broadcast::Receiver<BroadcastMessage>,
    origin: &str,
) -> JoinHandle<()> {
    let origin = origin.to_string();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message) if message.origin == origin => {
                    store.apply(&message.payload);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Vault engine: encrypted content, blob storage, and the on-ledger pointer.
//!
//! Every vault write follows the same shape: serialize the content, encrypt
//! it for the session's address, upload the ciphertext, then point the
//! ledger record at the new blob. Reads run the pipeline in reverse,
//! resolving the pointer through the ledger so the blob id never has to be
//! remembered client-side.
//!
//! Pointer updates carry no expected-prior-version, so two clients writing
//! concurrently are last-write-wins; the loser's blob stays in the store
//! but nothing references it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::blobstore::BlobStore;
use crate::codec;
use crate::config::DEFAULT_VAULT_POLICY_ID;
use crate::ledger::Ledger;
use crate::relay::{Relay, SyncEnvelope};
use crate::session::AuthenticatedSession;
use crate::state::SessionContext;

use super::error::VaultError;
use super::model::{EntryDraft, EntryPatch, PasswordEntry, VaultContent};
use super::VaultPointer;

/// Vault operations bound to the shared session context.
pub struct VaultEngine<L, B> {
    ledger: Arc<L>,
    blobs: Arc<B>,
    context: SessionContext,
    relay: Option<Relay>,
    policy_id: String,
}

impl<L: Ledger, B: BlobStore> VaultEngine<L, B> {
    pub fn new(ledger: Arc<L>, blobs: Arc<B>, context: SessionContext) -> Self {
        Self {
            ledger,
            blobs,
            context,
            relay: None,
            policy_id: DEFAULT_VAULT_POLICY_ID.to_string(),
        }
    }

    /// Attach a relay; every successful write then pushes a full snapshot
    /// to the secondary context.
    pub fn with_relay(mut self, relay: Relay) -> Self {
        self.relay = Some(relay);
        self
    }

    async fn session(&self) -> Result<AuthenticatedSession, VaultError> {
        self.context
            .current()
            .await
            .ok_or(VaultError::NotAuthenticated)
    }

    /// Create an empty vault for the authenticated account.
    pub async fn create_vault(&self) -> Result<(VaultPointer, VaultContent), VaultError> {
        let session = self.session().await?;
        let content = VaultContent::empty();

        let blob_id = self.seal_and_upload(&content, &session.address).await?;
        let pointer = self
            .ledger
            .create_pointer(&session.address, &blob_id, &self.policy_id)
            .await?;

        info!(pointer_id = %pointer.id, "vault created");
        self.announce(SyncEnvelope::SyncPasswords {
            passwords: content.relay_entries(),
        })
        .await;
        Ok((pointer, content))
    }

    /// Resolve and decrypt the account's vault, or `None` when no vault
    /// exists yet.
    pub async fn load_vault(&self) -> Result<Option<(VaultPointer, VaultContent)>, VaultError> {
        let session = self.session().await?;
        let pointers = self.ledger.pointers_owned_by(&session.address).await?;
        if pointers.len() > 1 {
            warn!(count = pointers.len(), "account owns multiple vault pointers");
        }

        // Deterministic winner among duplicates: highest version, then
        // latest update, then id.
        let Some(pointer) = pointers
            .into_iter()
            .max_by_key(|p| (p.version, p.updated_at, p.id.clone()))
        else {
            return Ok(None);
        };

        let bytes = self.blobs.download(&pointer.content_blob_id).await?;
        let content = decode_content(&bytes, &session.address)?;
        debug!(
            pointer_id = %pointer.id,
            entries = content.entries.len(),
            "vault loaded"
        );
        Ok(Some((pointer, content)))
    }

    /// Add a new entry; returns the materialized entry.
    pub async fn add_entry(&self, draft: EntryDraft) -> Result<PasswordEntry, VaultError> {
        let entry = PasswordEntry::from_draft(draft);
        let stored = entry.clone();
        self.mutate(move |content| {
            content.entries.push(entry);
            Ok(())
        })
        .await?;
        Ok(stored)
    }

    /// Patch an existing entry; returns the updated entry.
    pub async fn update_entry(
        &self,
        entry_id: &str,
        patch: EntryPatch,
    ) -> Result<PasswordEntry, VaultError> {
        let entry_id = entry_id.to_string();
        self.mutate(move |content| {
            let entry = content
                .entries
                .iter_mut()
                .find(|e| e.id == entry_id)
                .ok_or(VaultError::EntryNotFound(entry_id))?;
            patch.apply(entry);
            Ok(entry.clone())
        })
        .await
    }

    /// Remove one entry.
    pub async fn delete_entry(&self, entry_id: &str) -> Result<(), VaultError> {
        let entry_id = entry_id.to_string();
        self.mutate(move |content| {
            let before = content.entries.len();
            content.entries.retain(|e| e.id != entry_id);
            if content.entries.len() == before {
                return Err(VaultError::EntryNotFound(entry_id));
            }
            Ok(())
        })
        .await
    }

    /// Remove a set of entries in one write; ids not present are skipped.
    /// Returns the number actually removed.
    pub async fn delete_entries(&self, entry_ids: &[String]) -> Result<u64, VaultError> {
        let entry_ids = entry_ids.to_vec();
        self.mutate(move |content| {
            let before = content.entries.len();
            content.entries.retain(|e| !entry_ids.contains(&e.id));
            Ok((before - content.entries.len()) as u64)
        })
        .await
    }

    /// Destroy the vault pointer and clear the secondary snapshot. The
    /// content blob is left to expire with its retention period.
    pub async fn destroy_vault(&self) -> Result<(), VaultError> {
        let session = self.session().await?;
        let pointers = self.ledger.pointers_owned_by(&session.address).await?;
        if pointers.is_empty() {
            return Err(VaultError::NoVault);
        }
        for pointer in pointers {
            self.ledger.destroy_pointer(&pointer.id).await?;
        }
        info!("vault destroyed");
        self.announce(SyncEnvelope::ClearPasswords).await;
        Ok(())
    }

    /// Push the current vault contents to the secondary context.
    pub async fn sync_to_secondary(&self) -> Result<u64, VaultError> {
        let (_, content) = self.load_vault().await?.ok_or(VaultError::NoVault)?;
        let count = content.entries.len() as u64;
        self.announce(SyncEnvelope::SyncPasswords {
            passwords: content.relay_entries(),
        })
        .await;
        Ok(count)
    }

    /// Clear the secondary snapshot without touching the vault. Used on
    /// logout; needs no session.
    pub async fn clear_secondary(&self) {
        self.announce(SyncEnvelope::ClearPasswords).await;
    }

    /// Run one read-modify-write cycle against the vault.
    ///
    /// There is no compare-and-set against the pointer version; a
    /// concurrent writer between the read and the update is overwritten.
    async fn mutate<F, T>(&self, transform: F) -> Result<T, VaultError>
    where
        F: FnOnce(&mut VaultContent) -> Result<T, VaultError>,
    {
        let session = self.session().await?;
        let (pointer, mut content) = self.load_vault().await?.ok_or(VaultError::NoVault)?;

        let out = transform(&mut content)?;
        content.touch();

        let blob_id = self.seal_and_upload(&content, &session.address).await?;
        self.ledger
            .update_pointer(&pointer.id, &blob_id, content.metadata.total_entries)
            .await?;

        self.announce(SyncEnvelope::SyncPasswords {
            passwords: content.relay_entries(),
        })
        .await;
        Ok(out)
    }

    async fn seal_and_upload(
        &self,
        content: &VaultContent,
        identity: &str,
    ) -> Result<String, VaultError> {
        let json =
            serde_json::to_vec(content).map_err(|e| VaultError::Serialize(e.to_string()))?;
        let sealed = codec::encrypt(&json, identity)?;
        Ok(self.blobs.upload(sealed.as_bytes()).await?)
    }

    /// Relay delivery is best-effort: the vault write already succeeded, so
    /// a dead secondary only costs freshness there.
    async fn announce(&self, envelope: SyncEnvelope) {
        let Some(relay) = &self.relay else {
            return;
        };
        match relay.deliver(&envelope).await {
            Ok(ack) if !ack.success => {
                warn!(error = ?ack.error, "secondary rejected relay message");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "secondary sync skipped"),
        }
    }
}

/// Decode blob bytes into vault content.
///
/// The current format is an encrypted payload; vaults written before
/// encryption was introduced hold plaintext JSON. Any decryption failure,
/// including a failed authentication tag, falls through to the legacy
/// plaintext parse; only when both attempts fail is the vault unreadable.
fn decode_content(bytes: &[u8], identity: &str) -> Result<VaultContent, VaultError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| VaultError::Unreadable("blob is not text".to_string()))?;

    match codec::decrypt(text, identity) {
        Ok(plain) => serde_json::from_slice(&plain)
            .map_err(|e| VaultError::Unreadable(format!("decrypted payload: {e}"))),
        Err(decrypt_err) => serde_json::from_str(text).map_err(|_| {
            VaultError::Unreadable(format!(
                "decryption failed ({decrypt_err}) and legacy parse failed"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobstore::MemoryBlobStore;
    use crate::ledger::MemoryLedger;

    fn session_for(address: &str) -> AuthenticatedSession {
        AuthenticatedSession {
            identity_token: "token".to_string(),
            salt: "1234".to_string(),
            address: address.to_string(),
            max_epoch: 20,
            proof: serde_json::json!({"proofPoints": {}}),
            email: Some("user@example.com".to_string()),
            logged_in_at: 1_700_000_000_000,
        }
    }

    async fn engine_with_session() -> VaultEngine<MemoryLedger, MemoryBlobStore> {
        let context = SessionContext::new();
        context.set(session_for("0xabc")).await;
        VaultEngine::new(
            Arc::new(MemoryLedger::new()),
            Arc::new(MemoryBlobStore::new()),
            context,
        )
    }

    fn draft(site: &str) -> EntryDraft {
        EntryDraft {
            site: site.to_string(),
            url: format!("https://{}.example.com", site.to_lowercase()),
            username: "user".to_string(),
            password: "secret".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn operations_require_a_session() {
        let engine = VaultEngine::new(
            Arc::new(MemoryLedger::new()),
            Arc::new(MemoryBlobStore::new()),
            SessionContext::new(),
        );
        assert!(matches!(
            engine.create_vault().await.unwrap_err(),
            VaultError::NotAuthenticated
        ));
        assert!(matches!(
            engine.load_vault().await.unwrap_err(),
            VaultError::NotAuthenticated
        ));
    }

    #[tokio::test]
    async fn create_then_load_roundtrips_empty_vault() {
        let engine = engine_with_session().await;
        assert!(engine.load_vault().await.unwrap().is_none());

        let (pointer, content) = engine.create_vault().await.unwrap();
        assert_eq!(pointer.entry_count, 0);
        assert!(content.entries.is_empty());

        let (loaded_pointer, loaded) = engine.load_vault().await.unwrap().unwrap();
        assert_eq!(loaded_pointer.id, pointer.id);
        assert_eq!(loaded, content);
    }

    #[tokio::test]
    async fn add_update_delete_entry_lifecycle() {
        let engine = engine_with_session().await;
        engine.create_vault().await.unwrap();

        let entry = engine.add_entry(draft("Mail")).await.unwrap();
        let (pointer, content) = engine.load_vault().await.unwrap().unwrap();
        assert_eq!(pointer.entry_count, 1);
        assert_eq!(content.entries.len(), 1);
        assert!(content.is_consistent());

        let updated = engine
            .update_entry(
                &entry.id,
                EntryPatch {
                    password: Some("rotated".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.password, "rotated");
        assert_eq!(updated.site, "Mail");

        engine.delete_entry(&entry.id).await.unwrap();
        let (pointer, content) = engine.load_vault().await.unwrap().unwrap();
        assert_eq!(pointer.entry_count, 0);
        assert!(content.entries.is_empty());
    }

    #[tokio::test]
    async fn missing_entry_ids_are_reported() {
        let engine = engine_with_session().await;
        engine.create_vault().await.unwrap();

        assert!(matches!(
            engine
                .update_entry("no-such-id", EntryPatch::default())
                .await
                .unwrap_err(),
            VaultError::EntryNotFound(_)
        ));
        assert!(matches!(
            engine.delete_entry("no-such-id").await.unwrap_err(),
            VaultError::EntryNotFound(_)
        ));
    }

    #[tokio::test]
    async fn bulk_delete_removes_only_named_entries() {
        let engine = engine_with_session().await;
        engine.create_vault().await.unwrap();

        let x = engine.add_entry(draft("X")).await.unwrap();
        let y = engine.add_entry(draft("Y")).await.unwrap();
        engine.add_entry(draft("Z")).await.unwrap();

        let removed = engine
            .delete_entries(&[x.id, y.id, "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let (pointer, content) = engine.load_vault().await.unwrap().unwrap();
        assert_eq!(pointer.entry_count, 1);
        assert_eq!(content.entries[0].site, "Z");
    }

    #[tokio::test]
    async fn mutations_without_a_vault_are_rejected() {
        let engine = engine_with_session().await;
        assert!(matches!(
            engine.add_entry(draft("Mail")).await.unwrap_err(),
            VaultError::NoVault
        ));
        assert!(matches!(
            engine.destroy_vault().await.unwrap_err(),
            VaultError::NoVault
        ));
    }

    #[tokio::test]
    async fn destroy_removes_the_pointer() {
        let engine = engine_with_session().await;
        engine.create_vault().await.unwrap();
        engine.add_entry(draft("Mail")).await.unwrap();

        engine.destroy_vault().await.unwrap();
        assert!(engine.load_vault().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_picks_the_highest_version_pointer() {
        let ledger = Arc::new(MemoryLedger::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let context = SessionContext::new();
        context.set(session_for("0xabc")).await;

        // Two pointers for the same owner; only the newer one references
        // valid content.
        let stale = serde_json::to_vec(&VaultContent::empty()).unwrap();
        let stale_sealed = codec::encrypt(&stale, "0xabc").unwrap();
        let stale_blob = blobs.upload(stale_sealed.as_bytes()).await.unwrap();
        ledger
            .create_pointer("0xabc", &stale_blob, DEFAULT_VAULT_POLICY_ID)
            .await
            .unwrap();

        let mut fresh = VaultContent::empty();
        fresh.entries.push(PasswordEntry::from_draft(draft("Mail")));
        fresh.touch();
        let fresh_json = serde_json::to_vec(&fresh).unwrap();
        let fresh_sealed = codec::encrypt(&fresh_json, "0xabc").unwrap();
        let fresh_blob = blobs.upload(fresh_sealed.as_bytes()).await.unwrap();
        ledger
            .create_pointer("0xabc", &fresh_blob, DEFAULT_VAULT_POLICY_ID)
            .await
            .unwrap();

        let engine = VaultEngine::new(ledger, blobs, context);
        let (_, content) = engine.load_vault().await.unwrap().unwrap();
        assert_eq!(content.entries.len(), 1);
        assert_eq!(content.entries[0].site, "Mail");
    }

    #[tokio::test]
    async fn legacy_plaintext_blob_is_readable() {
        let ledger = Arc::new(MemoryLedger::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let context = SessionContext::new();
        context.set(session_for("0xabc")).await;

        let mut legacy = VaultContent::empty();
        legacy.entries.push(PasswordEntry::from_draft(draft("Old")));
        legacy.touch();
        let blob_id = blobs
            .upload(&serde_json::to_vec(&legacy).unwrap())
            .await
            .unwrap();
        ledger
            .create_pointer("0xabc", &blob_id, DEFAULT_VAULT_POLICY_ID)
            .await
            .unwrap();

        let engine = VaultEngine::new(ledger, blobs, context);
        let (_, content) = engine.load_vault().await.unwrap().unwrap();
        assert_eq!(content.entries[0].site, "Old");
    }

    #[tokio::test]
    async fn foreign_ciphertext_is_unreadable_after_legacy_fallback() {
        let ledger = Arc::new(MemoryLedger::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let context = SessionContext::new();
        context.set(session_for("0xabc")).await;

        // Content sealed for a different identity: the tag check fails, the
        // legacy plaintext parse is still attempted, and only then does the
        // read give up.
        let json = serde_json::to_vec(&VaultContent::empty()).unwrap();
        let sealed = codec::encrypt(&json, "0xother").unwrap();
        let blob_id = blobs.upload(sealed.as_bytes()).await.unwrap();
        ledger
            .create_pointer("0xabc", &blob_id, DEFAULT_VAULT_POLICY_ID)
            .await
            .unwrap();

        let engine = VaultEngine::new(ledger, blobs, context);
        let err = engine.load_vault().await.unwrap_err();
        match err {
            VaultError::Unreadable(message) => {
                assert!(message.contains("decryption failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn garbage_blob_is_unreadable() {
        let ledger = Arc::new(MemoryLedger::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let context = SessionContext::new();
        context.set(session_for("0xabc")).await;

        let blob_id = blobs.upload(b"not a vault at all").await.unwrap();
        ledger
            .create_pointer("0xabc", &blob_id, DEFAULT_VAULT_POLICY_ID)
            .await
            .unwrap();

        let engine = VaultEngine::new(ledger, blobs, context);
        assert!(matches!(
            engine.load_vault().await.unwrap_err(),
            VaultError::Unreadable(_)
        ));
    }
}

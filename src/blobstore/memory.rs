// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! In-process content-addressed blob store.

use std::collections::HashMap;

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::{BlobStore, BlobStoreError};

/// In-memory blob store keyed by the SHA-256 of the content.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blob_id(bytes: &[u8]) -> String {
        Base64UrlUnpadded::encode_string(&Sha256::digest(bytes))
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bytes: &[u8]) -> Result<String, BlobStoreError> {
        let id = Self::blob_id(bytes);
        self.blobs.lock().await.insert(id.clone(), bytes.to_vec());
        Ok(id)
    }

    async fn download(&self, blob_id: &str) -> Result<Vec<u8>, BlobStoreError> {
        self.blobs
            .lock()
            .await
            .get(blob_id)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(blob_id.to_string()))
    }

    async fn exists(&self, blob_id: &str) -> Result<bool, BlobStoreError> {
        Ok(self.blobs.lock().await.contains_key(blob_id))
    }
}

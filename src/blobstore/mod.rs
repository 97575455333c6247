// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Content-addressed blob store interface.
//!
//! Uploads return an id derived from the content; uploading identical bytes
//! twice yields the same id. The store holds only opaque ciphertext; all
//! structure lives client-side.

mod http;
mod memory;

use async_trait::async_trait;

pub use http::HttpBlobStore;
pub use memory::MemoryBlobStore;

/// Errors from blob-store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("blob upload failed: {0}")]
    Upload(String),

    #[error("blob download failed: {0}")]
    Download(String),

    #[error("blob not found: {0}")]
    NotFound(String),
}

/// Blob store operations needed by the vault engine.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes, returning the content-derived blob id. Idempotent for
    /// identical content.
    async fn upload(&self, bytes: &[u8]) -> Result<String, BlobStoreError>;

    /// Download the bytes for a blob id.
    async fn download(&self, blob_id: &str) -> Result<Vec<u8>, BlobStoreError>;

    /// Whether a blob id currently resolves.
    async fn exists(&self, blob_id: &str) -> Result<bool, BlobStoreError>;
}

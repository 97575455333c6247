// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! HTTP blob store client (publisher/aggregator split).
//!
//! Uploads go to the publisher, reads to the aggregator. The publisher
//! deduplicates by content: re-uploading certified bytes answers with the
//! existing blob id instead of creating a new one.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::BlobConfig;

use super::{BlobStore, BlobStoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Publisher/aggregator blob store client.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    publisher_url: String,
    aggregator_url: String,
    retention_epochs: u64,
    http: Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    newly_created: Option<NewlyCreated>,
    already_certified: Option<AlreadyCertified>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewlyCreated {
    blob_object: BlobObject,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobObject {
    blob_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlreadyCertified {
    blob_id: String,
}

impl HttpBlobStore {
    pub fn new(config: &BlobConfig) -> Result<Self, BlobStoreError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BlobStoreError::Upload(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            publisher_url: config.publisher_url.trim_end_matches('/').to_string(),
            aggregator_url: config.aggregator_url.trim_end_matches('/').to_string(),
            retention_epochs: config.retention_epochs,
            http,
        })
    }
}

#[async_trait::async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, bytes: &[u8]) -> Result<String, BlobStoreError> {
        let response = self
            .http
            .put(format!(
                "{}/v1/blobs?epochs={}",
                self.publisher_url, self.retention_epochs
            ))
            .header("Content-Type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| BlobStoreError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BlobStoreError::Upload(format!("{status}: {body}")));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| BlobStoreError::Upload(format!("invalid response: {e}")))?;

        if let Some(created) = body.newly_created {
            debug!(blob_id = %created.blob_object.blob_id, "uploaded new blob");
            Ok(created.blob_object.blob_id)
        } else if let Some(certified) = body.already_certified {
            debug!(blob_id = %certified.blob_id, "blob already certified");
            Ok(certified.blob_id)
        } else {
            Err(BlobStoreError::Upload(
                "no blob id in publisher response".to_string(),
            ))
        }
    }

    async fn download(&self, blob_id: &str) -> Result<Vec<u8>, BlobStoreError> {
        let response = self
            .http
            .get(format!("{}/v1/blobs/{blob_id}", self.aggregator_url))
            .send()
            .await
            .map_err(|e| BlobStoreError::Download(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BlobStoreError::NotFound(blob_id.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(BlobStoreError::Download(format!("{status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BlobStoreError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn exists(&self, blob_id: &str) -> Result<bool, BlobStoreError> {
        let response = self
            .http
            .head(format!("{}/v1/blobs/{blob_id}", self.aggregator_url))
            .send()
            .await
            .map_err(|e| BlobStoreError::Download(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

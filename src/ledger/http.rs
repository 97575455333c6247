// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! HTTP gateway client for the pointer-record ledger.
//!
//! The gateway fronts the ledger node and exposes pointer CRUD plus the
//! epoch counter as plain JSON endpoints. Transaction signing happens
//! gateway-side against the submitted authorization.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{Ledger, LedgerError, PointerRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Ledger gateway client.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    base_url: String,
    http: Client,
}

#[derive(Deserialize)]
struct EpochResponse {
    epoch: u64,
}

#[derive(Deserialize)]
struct PointersResponse {
    pointers: Vec<PointerRecord>,
}

impl HttpLedger {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LedgerError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
        if response.status() == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::NotFound(body));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Request(format!("{status}: {body}")));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Ledger for HttpLedger {
    async fn current_epoch(&self) -> Result<u64, LedgerError> {
        let response = self
            .http
            .get(format!("{}/v1/epoch", self.base_url))
            .send()
            .await
            .map_err(|e| LedgerError::Request(e.to_string()))?;
        let body: EpochResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        Ok(body.epoch)
    }

    async fn pointers_owned_by(&self, owner: &str) -> Result<Vec<PointerRecord>, LedgerError> {
        let response = self
            .http
            .get(format!("{}/v1/pointers", self.base_url))
            .query(&[("owner", owner)])
            .send()
            .await
            .map_err(|e| LedgerError::Request(e.to_string()))?;
        let body: PointersResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        Ok(body.pointers)
    }

    async fn create_pointer(
        &self,
        owner: &str,
        blob_id: &str,
        policy_id: &str,
    ) -> Result<PointerRecord, LedgerError> {
        let response = self
            .http
            .post(format!("{}/v1/pointers", self.base_url))
            .json(&serde_json::json!({
                "owner": owner,
                "contentBlobId": blob_id,
                "policyId": policy_id,
            }))
            .send()
            .await
            .map_err(|e| LedgerError::Request(e.to_string()))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    async fn update_pointer(
        &self,
        pointer_id: &str,
        blob_id: &str,
        entry_count: u64,
    ) -> Result<PointerRecord, LedgerError> {
        let response = self
            .http
            .post(format!("{}/v1/pointers/{pointer_id}/update", self.base_url))
            .json(&serde_json::json!({
                "contentBlobId": blob_id,
                "entryCount": entry_count,
            }))
            .send()
            .await
            .map_err(|e| LedgerError::Request(e.to_string()))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    async fn destroy_pointer(&self, pointer_id: &str) -> Result<(), LedgerError> {
        let response = self
            .http
            .post(format!("{}/v1/pointers/{pointer_id}/destroy", self.base_url))
            .send()
            .await
            .map_err(|e| LedgerError::Request(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }
}

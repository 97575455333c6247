// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Clients for the external login services: the secret-issuance (salt)
//! service and the ZK proof service.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::SessionError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the secret-issuance service.
///
/// Exchanges an identity token for the user's derived secret ("salt").
#[derive(Debug, Clone)]
pub struct SaltClient {
    url: String,
    http: Client,
}

#[derive(Serialize)]
struct SaltRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct SaltResponse {
    salt: String,
}

impl SaltClient {
    pub fn new(url: impl Into<String>) -> Result<Self, SessionError> {
        Ok(Self {
            url: url.into(),
            http: build_http(|e| SessionError::SaltService(e))?,
        })
    }

    /// `POST {token} → {salt}`. Any non-success response is surfaced with
    /// its body.
    pub async fn fetch_salt(&self, identity_token: &str) -> Result<String, SessionError> {
        let response = self
            .http
            .post(&self.url)
            .json(&SaltRequest {
                token: identity_token,
            })
            .send()
            .await
            .map_err(|e| SessionError::SaltService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::SaltService(format!("{status}: {body}")));
        }

        let body: SaltResponse = response
            .json()
            .await
            .map_err(|e| SessionError::SaltService(format!("invalid response: {e}")))?;
        Ok(body.salt)
    }
}

/// Proof request payload. Field names follow the prover's wire format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest<'a> {
    pub jwt: &'a str,
    /// Extended ephemeral public key as a byte array (scheme flag + key).
    pub extended_ephemeral_public_key: Vec<u8>,
    pub max_epoch: u64,
    pub jwt_randomness: &'a str,
    pub salt: &'a str,
    pub key_claim_name: &'a str,
}

/// Client for the ZK proof service.
#[derive(Debug, Clone)]
pub struct ProverClient {
    url: String,
    http: Client,
}

impl ProverClient {
    pub fn new(url: impl Into<String>) -> Result<Self, SessionError> {
        Ok(Self {
            url: url.into(),
            http: build_http(|e| SessionError::ProofService(e))?,
        })
    }

    /// Request a correctness proof for a completed login. The proof is
    /// treated as opaque JSON.
    pub async fn fetch_proof(
        &self,
        request: &ProofRequest<'_>,
    ) -> Result<serde_json::Value, SessionError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| SessionError::ProofService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::ProofService(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| SessionError::ProofService(format!("invalid response: {e}")))
    }
}

fn build_http<F>(to_error: F) -> Result<Client, SessionError>
where
    F: FnOnce(String) -> SessionError,
{
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| to_error(format!("failed to build HTTP client: {e}")))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! configuration structs loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ZKVAULT_CLIENT_ID` | Federated identity provider OAuth client id | Required |
//! | `ZKVAULT_REDIRECT_URI` | OAuth callback URI | `http://localhost:5173/auth/callback` |
//! | `ZKVAULT_SALT_SERVICE_URL` | Secret-issuance (salt) service endpoint | Mysten salt API |
//! | `ZKVAULT_PROVER_URL` | ZK proof service endpoint | Mysten dev prover |
//! | `ZKVAULT_LEDGER_GATEWAY_URL` | Pointer-record ledger gateway base URL | Required for HTTP ledger |
//! | `ZKVAULT_BLOB_PUBLISHER_URL` | Blob store publisher base URL | Walrus testnet publisher |
//! | `ZKVAULT_BLOB_AGGREGATOR_URL` | Blob store aggregator base URL | Walrus testnet aggregator |
//! | `ZKVAULT_BLOB_RETENTION_EPOCHS` | Blob storage retention in epochs | `5` |
//! | `ZKVAULT_SESSION_FILE` | Durable session persistence path | `zkvault-session.json` |

use std::env;

/// Environment variable name for the OAuth client id.
pub const CLIENT_ID_ENV: &str = "ZKVAULT_CLIENT_ID";

/// Environment variable name for the OAuth redirect URI.
pub const REDIRECT_URI_ENV: &str = "ZKVAULT_REDIRECT_URI";

/// Environment variable name for the salt service endpoint.
pub const SALT_SERVICE_URL_ENV: &str = "ZKVAULT_SALT_SERVICE_URL";

/// Environment variable name for the proof service endpoint.
pub const PROVER_URL_ENV: &str = "ZKVAULT_PROVER_URL";

/// Environment variable name for the ledger gateway base URL.
pub const LEDGER_GATEWAY_URL_ENV: &str = "ZKVAULT_LEDGER_GATEWAY_URL";

/// Environment variable name for the blob publisher base URL.
pub const BLOB_PUBLISHER_URL_ENV: &str = "ZKVAULT_BLOB_PUBLISHER_URL";

/// Environment variable name for the blob aggregator base URL.
pub const BLOB_AGGREGATOR_URL_ENV: &str = "ZKVAULT_BLOB_AGGREGATOR_URL";

/// Environment variable name for blob retention (in ledger epochs).
pub const BLOB_RETENTION_EPOCHS_ENV: &str = "ZKVAULT_BLOB_RETENTION_EPOCHS";

/// Environment variable name for the durable session file path.
pub const SESSION_FILE_ENV: &str = "ZKVAULT_SESSION_FILE";

const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/auth/callback";
const DEFAULT_SALT_SERVICE_URL: &str = "https://salt.api.mystenlabs.com/get_salt";
const DEFAULT_PROVER_URL: &str = "https://prover-dev.mystenlabs.com/v1";
const DEFAULT_BLOB_PUBLISHER_URL: &str = "https://publisher.walrus-testnet.walrus.space";
const DEFAULT_BLOB_AGGREGATOR_URL: &str = "https://aggregator.walrus-testnet.walrus.space";
const DEFAULT_BLOB_RETENTION_EPOCHS: u64 = 5;

/// Authorization endpoint of the identity provider.
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// OAuth scope requested during login.
pub const OAUTH_SCOPE: &str = "openid email profile";

/// Session validity window: how many epochs past the current one a fresh
/// session stays valid (~1 epoch per day on testnet).
pub const MAX_EPOCH_OFFSET: u64 = 10;

/// Identity-token claim the address derivation is keyed on.
pub const DEFAULT_KEY_CLAIM_NAME: &str = "sub";

/// Policy id recorded on newly created vault pointers.
pub const DEFAULT_VAULT_POLICY_ID: &str = "chacha20-poly1305";

/// Configuration error. Surfaced before any network call is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {name}: {message}")]
    InvalidValue {
        name: &'static str,
        message: String,
    },
}

/// Federated login configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth client id issued by the identity provider.
    pub client_id: String,
    /// Callback URI registered with the identity provider.
    pub redirect_uri: String,
    /// Salt (secret-issuance) service endpoint.
    pub salt_service_url: String,
    /// ZK proof service endpoint.
    pub prover_url: String,
    /// Claim name used for address derivation and proof requests.
    pub key_claim_name: String,
    /// Epoch offset added to the current ledger epoch to form `max_epoch`.
    pub max_epoch_offset: u64,
}

impl AuthConfig {
    /// Check whether the required provider credentials are present.
    pub fn is_configured() -> bool {
        required_env_present(CLIENT_ID_ENV)
    }

    /// Load the login configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: env_required(CLIENT_ID_ENV)?,
            redirect_uri: env_or_default(REDIRECT_URI_ENV, DEFAULT_REDIRECT_URI),
            salt_service_url: env_or_default(SALT_SERVICE_URL_ENV, DEFAULT_SALT_SERVICE_URL),
            prover_url: env_or_default(PROVER_URL_ENV, DEFAULT_PROVER_URL),
            key_claim_name: DEFAULT_KEY_CLAIM_NAME.to_string(),
            max_epoch_offset: MAX_EPOCH_OFFSET,
        })
    }
}

/// Blob store configuration.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Publisher base URL (uploads).
    pub publisher_url: String,
    /// Aggregator base URL (downloads).
    pub aggregator_url: String,
    /// How many epochs uploaded blobs are retained for.
    pub retention_epochs: u64,
}

impl BlobConfig {
    /// Load the blob store configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let retention = env_or_default(
            BLOB_RETENTION_EPOCHS_ENV,
            &DEFAULT_BLOB_RETENTION_EPOCHS.to_string(),
        );
        let retention_epochs = retention.parse().map_err(|_| ConfigError::InvalidValue {
            name: BLOB_RETENTION_EPOCHS_ENV,
            message: format!("expected an integer, got {retention:?}"),
        })?;

        Ok(Self {
            publisher_url: env_or_default(BLOB_PUBLISHER_URL_ENV, DEFAULT_BLOB_PUBLISHER_URL),
            aggregator_url: env_or_default(BLOB_AGGREGATOR_URL_ENV, DEFAULT_BLOB_AGGREGATOR_URL),
            retention_epochs,
        })
    }
}

fn required_env_present(name: &str) -> bool {
    env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name)),
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Cross-context relay for mirroring credentials into a secondary context.
//!
//! The primary pushes full replacement snapshots; the secondary holds the
//! latest snapshot and answers site lookups. Delivery runs over an ordered
//! list of transports: the first transport that completes an exchange wins,
//! and failures fall through to the next one with a warning.

pub mod store;
pub mod transport;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use store::{attach, attach_broadcast, SnapshotStore};
pub use transport::{
    AddressedMessage, BroadcastMessage, BroadcastTransport, DirectTransport, SyncTransport,
    TransportError, BROADCAST_ORIGIN,
};

/// One credential as it crosses the relay. Deliberately flat and free of
/// vault-internal fields; timestamps and notes stay on the primary side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEntry {
    pub id: String,
    pub site: String,
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Wire messages exchanged with the secondary context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SyncEnvelope {
    /// Replace the secondary snapshot wholesale.
    SyncPasswords { passwords: Vec<RelayEntry> },
    /// Drop the secondary snapshot.
    ClearPasswords,
    /// Credentials for the page the secondary is looking at.
    FillPassword { username: String, password: String },
    /// User-visible notice when no credentials match.
    ShowNotification { message: String },
}

/// Acknowledgement for a relayed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncAck {
    /// Successful application touching `count` entries.
    pub fn ok(count: u64) -> Self {
        Self {
            success: true,
            count: Some(count),
            error: None,
        }
    }

    /// Accepted for delivery with no application report (fire-and-forget
    /// transports).
    pub fn accepted() -> Self {
        Self {
            success: true,
            count: None,
            error: None,
        }
    }

    /// Rejected by the receiver.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: None,
            error: Some(error.into()),
        }
    }
}

/// Errors from a relay delivery.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("message could not be encoded: {0}")]
    Encode(String),

    #[error("every relay transport failed")]
    AllTransportsFailed,
}

/// Ordered-fallback delivery over a set of transports.
pub struct Relay {
    transports: Vec<Box<dyn SyncTransport>>,
}

impl Relay {
    /// Transports are tried in the order given.
    pub fn new(transports: Vec<Box<dyn SyncTransport>>) -> Self {
        Self { transports }
    }

    /// Deliver one envelope, falling back across transports.
    ///
    /// A receiver-side rejection still counts as delivered: the exchange
    /// completed and the acknowledgement is returned as-is.
    pub async fn deliver(&self, envelope: &SyncEnvelope) -> Result<SyncAck, RelayError> {
        let payload =
            serde_json::to_value(envelope).map_err(|e| RelayError::Encode(e.to_string()))?;

        for (index, transport) in self.transports.iter().enumerate() {
            match transport.deliver(&payload).await {
                Ok(ack) => {
                    if index > 0 {
                        debug!(transport = transport.name(), "delivered via fallback transport");
                    }
                    return Ok(ack);
                }
                Err(err) => {
                    warn!(transport = transport.name(), error = %err, "relay transport failed");
                }
            }
        }
        Err(RelayError::AllTransportsFailed)
    }
}

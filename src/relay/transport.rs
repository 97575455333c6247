// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Concrete transports for the secondary-context relay.
//!
//! `DirectTransport` models a request/reply port to a co-operating context:
//! each message carries a one-shot reply channel and delivery waits for the
//! acknowledgement (bounded by a timeout). `BroadcastTransport` models a
//! shared broadcast bus where anyone can listen; messages are tagged with an
//! origin so unrelated traffic can be filtered out, and delivery is
//! fire-and-forget.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::SyncAck;

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Origin tag for broadcast traffic produced by this crate.
pub const BROADCAST_ORIGIN: &str = "zkvault";

/// Errors from a single transport attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No receiver is currently attached to the transport.
    #[error("transport unavailable: no receiver attached")]
    Unavailable,

    /// The receiver did not acknowledge within the reply timeout.
    #[error("transport timed out waiting for acknowledgement")]
    Timeout,

    /// The receiver went away mid-exchange.
    #[error("transport closed before acknowledging")]
    Closed,
}

/// A one-way delivery channel to the secondary context.
///
/// Transports carry the already-serialized wire form so that the receiving
/// side sees exactly what crosses the process boundary.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Short transport name, used in degradation logs.
    fn name(&self) -> &'static str;

    /// Deliver one message and wait for the acknowledgement where the
    /// transport supports one.
    async fn deliver(&self, payload: &serde_json::Value) -> Result<SyncAck, TransportError>;
}

/// One message on a [`DirectTransport`] channel, with its reply slot.
#[derive(Debug)]
pub struct AddressedMessage {
    pub payload: serde_json::Value,
    pub reply: oneshot::Sender<SyncAck>,
}

/// Request/reply transport over an in-process channel.
pub struct DirectTransport {
    tx: mpsc::Sender<AddressedMessage>,
    reply_timeout: Duration,
}

impl DirectTransport {
    pub fn new(tx: mpsc::Sender<AddressedMessage>) -> Self {
        Self {
            tx,
            reply_timeout: REPLY_TIMEOUT,
        }
    }

    /// Build a transport together with the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AddressedMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    #[cfg(test)]
    pub(crate) fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }
}

#[async_trait]
impl SyncTransport for DirectTransport {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn deliver(&self, payload: &serde_json::Value) -> Result<SyncAck, TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(AddressedMessage {
                payload: payload.clone(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| TransportError::Unavailable)?;

        match tokio::time::timeout(self.reply_timeout, reply_rx).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

/// One message on the broadcast bus.
#[derive(Debug, Clone)]
pub struct BroadcastMessage {
    /// Sender identification; receivers filter on it.
    pub origin: String,
    pub payload: serde_json::Value,
}

/// Fire-and-forget transport over a shared broadcast bus.
pub struct BroadcastTransport {
    tx: broadcast::Sender<BroadcastMessage>,
}

impl BroadcastTransport {
    pub fn new(tx: broadcast::Sender<BroadcastMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl SyncTransport for BroadcastTransport {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    async fn deliver(&self, payload: &serde_json::Value) -> Result<SyncAck, TransportError> {
        self.tx
            .send(BroadcastMessage {
                origin: BROADCAST_ORIGIN.to_string(),
                payload: payload.clone(),
            })
            .map_err(|_| TransportError::Unavailable)?;
        // No reply path on a broadcast bus; report acceptance only.
        Ok(SyncAck::accepted())
    }
}

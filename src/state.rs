// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Shared session context.
//!
//! The authenticated session is a process-wide singleton owned by the
//! session engine and read by the vault engine. It is held behind a shared
//! handle so that both engines observe the same login state without ambient
//! globals.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::session::AuthenticatedSession;

/// Shared handle to the current authenticated session, if any.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<AuthenticatedSession>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session.
    pub async fn current(&self) -> Option<AuthenticatedSession> {
        self.inner.read().await.clone()
    }

    /// Whether a session is currently installed.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Replace the session wholesale. Sessions are never mutated in place.
    pub async fn set(&self, session: AuthenticatedSession) {
        *self.inner.write().await = Some(session);
    }

    /// Drop the session.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Session persistence.
//!
//! Two backing stores with different lifetimes sit behind one trait: the
//! ephemeral side is scoped to the current browser session (here, the
//! process), while the authenticated side is durable across restarts. The
//! file-backed implementation writes JSON atomically via temp-file rename.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::SESSION_FILE_ENV;

use super::{AuthenticatedSession, EphemeralSession};

const DEFAULT_SESSION_FILE: &str = "zkvault-session.json";

/// Error type for session persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("session store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence boundary for login state.
pub trait SessionStore: Send + Sync {
    /// Load the in-flight login attempt, if any.
    fn load_ephemeral(&self) -> Result<Option<EphemeralSession>, SessionStoreError>;
    /// Persist an in-flight login attempt, replacing any prior one.
    fn save_ephemeral(&self, session: &EphemeralSession) -> Result<(), SessionStoreError>;
    /// Discard the in-flight login attempt.
    fn clear_ephemeral(&self) -> Result<(), SessionStoreError>;

    /// Load the durable authenticated session, if any.
    fn load_authenticated(&self) -> Result<Option<AuthenticatedSession>, SessionStoreError>;
    /// Persist the authenticated session, replacing any prior one.
    fn save_authenticated(&self, session: &AuthenticatedSession) -> Result<(), SessionStoreError>;
    /// Discard the durable authenticated session.
    fn clear_authenticated(&self) -> Result<(), SessionStoreError>;
}

/// In-memory store. Used in tests and by hosts that manage persistence
/// themselves.
#[derive(Default)]
pub struct MemorySessionStore {
    ephemeral: Mutex<Option<EphemeralSession>>,
    authenticated: Mutex<Option<AuthenticatedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load_ephemeral(&self) -> Result<Option<EphemeralSession>, SessionStoreError> {
        Ok(lock(&self.ephemeral).clone())
    }

    fn save_ephemeral(&self, session: &EphemeralSession) -> Result<(), SessionStoreError> {
        *lock(&self.ephemeral) = Some(session.clone());
        Ok(())
    }

    fn clear_ephemeral(&self) -> Result<(), SessionStoreError> {
        *lock(&self.ephemeral) = None;
        Ok(())
    }

    fn load_authenticated(&self) -> Result<Option<AuthenticatedSession>, SessionStoreError> {
        Ok(lock(&self.authenticated).clone())
    }

    fn save_authenticated(&self, session: &AuthenticatedSession) -> Result<(), SessionStoreError> {
        *lock(&self.authenticated) = Some(session.clone());
        Ok(())
    }

    fn clear_authenticated(&self) -> Result<(), SessionStoreError> {
        *lock(&self.authenticated) = None;
        Ok(())
    }
}

/// File-backed store: the authenticated session lives in a JSON file, the
/// ephemeral attempt stays in memory (its lifetime is the process, matching
/// browser-session storage).
pub struct FileSessionStore {
    path: PathBuf,
    ephemeral: Mutex<Option<EphemeralSession>>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ephemeral: Mutex::new(None),
        }
    }

    /// Build from `ZKVAULT_SESSION_FILE`, falling back to the default path
    /// in the working directory.
    pub fn from_env() -> Self {
        let path = std::env::var(SESSION_FILE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());
        Self::new(path)
    }

    /// Path of the durable session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, session: &AuthenticatedSession) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write to a temp file first, then rename for atomicity.
        let temp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, session)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load_ephemeral(&self) -> Result<Option<EphemeralSession>, SessionStoreError> {
        Ok(lock(&self.ephemeral).clone())
    }

    fn save_ephemeral(&self, session: &EphemeralSession) -> Result<(), SessionStoreError> {
        *lock(&self.ephemeral) = Some(session.clone());
        Ok(())
    }

    fn clear_ephemeral(&self) -> Result<(), SessionStoreError> {
        *lock(&self.ephemeral) = None;
        Ok(())
    }

    fn load_authenticated(&self) -> Result<Option<AuthenticatedSession>, SessionStoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(session))
    }

    fn save_authenticated(&self, session: &AuthenticatedSession) -> Result<(), SessionStoreError> {
        self.write_atomic(session)
    }

    fn clear_authenticated(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // Poisoning only occurs if a holder panicked; the data is plain state.
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

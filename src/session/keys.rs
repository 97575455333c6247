// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Ephemeral key material for one login attempt.
//!
//! A fresh Ed25519 keypair and randomness value are generated at the start
//! of every login and never reused across sessions. The login nonce binds
//! the public key, expiry epoch, and randomness together so the identity
//! provider's assertion commits to this exact attempt.

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{Ed25519KeyPair, KeyPair};
use sha2::{Digest, Sha256};

use super::SessionError;

/// Signature scheme flag prepended to the public key on the wire.
const ED25519_SCHEME_FLAG: u8 = 0x00;

/// Freshly generated ephemeral keypair.
pub struct EphemeralKeyMaterial {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl EphemeralKeyMaterial {
    /// Generate a new ephemeral Ed25519 keypair.
    pub fn generate(rng: &SystemRandom) -> Result<Self, SessionError> {
        let document =
            Ed25519KeyPair::generate_pkcs8(rng).map_err(|_| SessionError::KeyGeneration)?;
        let keypair = Ed25519KeyPair::from_pkcs8(document.as_ref())
            .map_err(|_| SessionError::KeyGeneration)?;

        Ok(Self {
            pkcs8: document.as_ref().to_vec(),
            public_key: keypair.public_key().as_ref().to_vec(),
        })
    }

    /// PKCS#8 document bytes, for session-scoped persistence.
    pub fn pkcs8(&self) -> &[u8] {
        &self.pkcs8
    }

    /// Raw 32-byte public key.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

/// Public key in extended wire form: scheme flag byte followed by the raw
/// key bytes. This is the form the proof service expects.
pub fn extended_public_key(public_key: &[u8]) -> Vec<u8> {
    let mut extended = Vec::with_capacity(public_key.len() + 1);
    extended.push(ED25519_SCHEME_FLAG);
    extended.extend_from_slice(public_key);
    extended
}

/// Generate the per-attempt login randomness (a random 128-bit integer
/// rendered as a decimal string).
pub fn generate_randomness(rng: &SystemRandom) -> Result<String, SessionError> {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes).map_err(|_| SessionError::KeyGeneration)?;
    Ok(u128::from_be_bytes(bytes).to_string())
}

/// Compute the login nonce.
///
/// Pure function of `(ephemeral public key, max epoch, randomness)`; equal
/// inputs always yield equal nonces.
pub fn compute_nonce(public_key: &[u8], max_epoch: u64, randomness: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(public_key);
    hasher.update(max_epoch.to_be_bytes());
    hasher.update(randomness.as_bytes());
    Base64UrlUnpadded::encode_string(&hasher.finalize())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Symmetric encryption codec for the vault payload.
//!
//! Payload framing is `base64(nonce || ciphertext)` with a fresh random
//! nonce per encryption and an authenticated cipher (ChaCha20-Poly1305), so
//! wrong keys and corrupted data fail closed at the tag check.
//!
//! ## Key derivation caveat
//!
//! The key is derived deterministically from the identity string (the
//! user's public address) with a reversible mixing function, not a KDF over
//! a secret. Anyone who knows the address can reconstruct the key. A
//! hardened scheme would derive the key from a value only the legitimate
//! user can obtain, such as the session's issued salt, through a vetted
//! KDF. Kept as-is for payload compatibility with existing vaults.

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, CHACHA20_POLY1305, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

/// Errors from encrypt/decrypt.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Authentication tag did not verify: wrong key or corrupted data.
    /// Callers must not attempt partial decryption after this.
    #[error("decryption failed: authentication tag mismatch or corrupted data")]
    AuthenticationFailed,

    /// The encoded payload is not valid `base64(nonce || ciphertext)`.
    #[error("encrypted payload is malformed: {0}")]
    Malformed(String),

    /// Encryption-side failure (nonce generation or sealing).
    #[error("encryption failed")]
    EncryptionFailed,
}

const KEY_LEN: usize = 32;

/// Derive the fixed-length symmetric key from the identity string.
///
/// Deterministic byte mixing over the identity; see the module caveat.
fn derive_key(identity: &str) -> [u8; KEY_LEN] {
    let bytes = identity.as_bytes();
    let mut key = [0u8; KEY_LEN];
    if bytes.is_empty() {
        return key;
    }
    for (i, slot) in key.iter_mut().enumerate() {
        *slot = bytes[i % bytes.len()] ^ (i as u8).wrapping_mul(7);
    }
    key
}

fn aead_key(identity: &str) -> Result<LessSafeKey, CodecError> {
    let unbound = UnboundKey::new(&CHACHA20_POLY1305, &derive_key(identity))
        .map_err(|_| CodecError::EncryptionFailed)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt a plaintext payload for an identity.
///
/// Returns `base64(nonce || ciphertext)`. Each call uses a fresh random
/// nonce, so equal plaintexts encrypt to distinct payloads.
pub fn encrypt(plaintext: &[u8], identity: &str) -> Result<String, CodecError> {
    let key = aead_key(identity)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| CodecError::EncryptionFailed)?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CodecError::EncryptionFailed)?;

    let mut framed = Vec::with_capacity(NONCE_LEN + in_out.len());
    framed.extend_from_slice(&nonce_bytes);
    framed.extend_from_slice(&in_out);
    Ok(Base64::encode_string(&framed))
}

/// Decrypt a payload produced by [`encrypt`] for the same identity.
pub fn decrypt(encoded: &str, identity: &str) -> Result<Vec<u8>, CodecError> {
    let framed = Base64::decode_vec(encoded.trim())
        .map_err(|e| CodecError::Malformed(format!("invalid base64: {e}")))?;

    if framed.len() < NONCE_LEN {
        return Err(CodecError::Malformed(
            "payload shorter than the nonce".to_string(),
        ));
    }
    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);

    let key = aead_key(identity)?;
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| CodecError::Malformed("invalid nonce".to_string()))?;

    let mut in_out = ciphertext.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CodecError::AuthenticationFailed)?;
    Ok(plaintext.to_vec())
}

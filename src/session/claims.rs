// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Identity-token claim extraction.
//!
//! Tokens are decoded without signature verification: the proof service
//! verifies the token against the provider's keys as part of proof
//! generation, and the ledger rejects signatures built from forged claims.
//! The client only needs the claim values.

use jsonwebtoken::dangerous::insecure_decode;
use serde::Deserialize;

use super::SessionError;

/// Claims extracted from a federated identity token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdClaims {
    /// Subject: the provider's stable user identifier.
    pub sub: String,
    /// Issuer URL.
    pub iss: String,
    /// Audience: the OAuth client id the token was issued to.
    pub aud: Audience,
    /// Email claim, if the `email` scope was granted.
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration timestamp (provider wall-clock, unused for session
    /// expiry, which is epoch-based).
    #[serde(default)]
    pub exp: i64,
}

/// The `aud` claim is a single string for most providers but may be an
/// array per the OIDC spec.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// The audience the token was primarily issued to.
    pub fn primary(&self) -> &str {
        match self {
            Audience::One(aud) => aud,
            Audience::Many(auds) => auds.first().map(String::as_str).unwrap_or(""),
        }
    }
}

/// Decode the claims of an identity token.
pub fn extract_claims(token: &str) -> Result<IdClaims, SessionError> {
    insecure_decode::<IdClaims>(token)
        .map(|data| data.claims)
        .map_err(|e| SessionError::InvalidToken(e.to_string()))
}

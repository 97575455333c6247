// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 zkVault Contributors

//! Federated login state machine.
//!
//! Converts a one-time identity assertion into a durable, epoch-bounded
//! session:
//!
//! 1. `begin_login` generates ephemeral key material and yields the
//!    provider redirect URL carrying the login nonce.
//! 2. `complete_login` consumes the callback token: salt exchange, address
//!    derivation, proof retrieval, session persistence.
//! 3. `restore_session` revalidates a persisted session on process start.
//!
//! Failures during `complete_login` never leave a partially populated
//! session behind; the flow falls back to unauthenticated and the error is
//! surfaced.

use base64ct::{Base64, Encoding};
use ring::rand::SystemRandom;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{AuthConfig, ConfigError, AUTHORIZE_ENDPOINT, CLIENT_ID_ENV, OAUTH_SCOPE};
use crate::ledger::Ledger;
use crate::state::SessionContext;

use super::claims::{extract_claims, IdClaims};
use super::keys::{self, EphemeralKeyMaterial};
use super::services::{ProofRequest, ProverClient, SaltClient};
use super::store::SessionStore;
use super::{AuthenticatedSession, EphemeralSession, LoginState, SessionError};

/// Output of `begin_login`: everything the UI shell needs to redirect the
/// user to the identity provider.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Fully assembled authorization URL.
    pub authorize_url: String,
    /// Nonce embedded in the URL, for diagnostics.
    pub nonce: String,
    /// Expiry epoch the attempt is bound to.
    pub max_epoch: u64,
}

/// A transaction-authorization signature assembled from the session proof,
/// the identity claims, and the caller-provided user signature.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAuthorization {
    /// Proof inputs with the derived address seed attached.
    pub inputs: serde_json::Value,
    pub max_epoch: u64,
    /// Base64-encoded user signature over the transaction bytes.
    pub user_signature: String,
}

/// Driver for the login state machine.
pub struct SessionEngine<L, S> {
    config: AuthConfig,
    ledger: L,
    store: S,
    context: SessionContext,
    salt_client: SaltClient,
    prover_client: ProverClient,
    rng: SystemRandom,
}

impl<L: Ledger, S: SessionStore> SessionEngine<L, S> {
    pub fn new(
        config: AuthConfig,
        ledger: L,
        store: S,
        context: SessionContext,
    ) -> Result<Self, SessionError> {
        let salt_client = SaltClient::new(config.salt_service_url.clone())?;
        let prover_client = ProverClient::new(config.prover_url.clone())?;
        Ok(Self {
            config,
            ledger,
            store,
            context,
            salt_client,
            prover_client,
            rng: SystemRandom::new(),
        })
    }

    /// Shared session context handle, for wiring into the vault engine.
    pub fn context(&self) -> SessionContext {
        self.context.clone()
    }

    /// Observable login state.
    pub async fn state(&self) -> Result<LoginState, SessionError> {
        if self.context.is_authenticated().await {
            return Ok(LoginState::Authenticated);
        }
        if self.store.load_ephemeral()?.is_some() {
            return Ok(LoginState::AwaitingCallback);
        }
        Ok(LoginState::Unauthenticated)
    }

    /// Start a login flow.
    ///
    /// Generates a fresh ephemeral keypair and randomness, binds them to an
    /// expiry epoch through the nonce, persists the attempt, and returns
    /// the provider redirect URL. Calling this while already authenticated
    /// starts a fresh flow without logging out; any prior in-flight attempt
    /// is overwritten.
    pub async fn begin_login(&self) -> Result<LoginRequest, SessionError> {
        if self.config.client_id.trim().is_empty() {
            return Err(ConfigError::MissingEnv(CLIENT_ID_ENV).into());
        }

        let current_epoch = self.ledger.current_epoch().await?;
        let max_epoch = current_epoch + self.config.max_epoch_offset;
        debug!(current_epoch, max_epoch, "starting login flow");

        let material = EphemeralKeyMaterial::generate(&self.rng)?;
        let randomness = keys::generate_randomness(&self.rng)?;
        let nonce = keys::compute_nonce(material.public_key(), max_epoch, &randomness);

        let ephemeral = EphemeralSession {
            keypair_pkcs8: material.pkcs8().to_vec(),
            public_key: material.public_key().to_vec(),
            randomness,
            max_epoch,
            nonce: nonce.clone(),
        };
        self.store.save_ephemeral(&ephemeral)?;

        let authorize_url = self.build_authorize_url(&nonce)?;
        Ok(LoginRequest {
            authorize_url,
            nonce,
            max_epoch,
        })
    }

    /// Complete a login flow from the provider callback token.
    ///
    /// Performs, in order: salt exchange, address derivation (pure), proof
    /// retrieval, session persistence. The ephemeral attempt is consumed
    /// exactly once. On any failure the state falls back to
    /// unauthenticated.
    pub async fn complete_login(
        &self,
        identity_token: &str,
    ) -> Result<AuthenticatedSession, SessionError> {
        match self.try_complete_login(identity_token).await {
            Ok(session) => {
                info!(address = %session.address, "login completed");
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "login failed; clearing session state");
                let _ = self.store.clear_ephemeral();
                let _ = self.store.clear_authenticated();
                self.context.clear().await;
                Err(e)
            }
        }
    }

    async fn try_complete_login(
        &self,
        identity_token: &str,
    ) -> Result<AuthenticatedSession, SessionError> {
        let claims = extract_claims(identity_token)?;

        let ephemeral = self
            .store
            .load_ephemeral()?
            .ok_or(SessionError::SessionMissing(
                "no ephemeral login attempt found; the browser session may have been cleared",
            ))?;

        let salt = self.salt_client.fetch_salt(identity_token).await?;
        let address = derive_address(&claims, &salt, &self.config.key_claim_name);

        let proof = self
            .prover_client
            .fetch_proof(&ProofRequest {
                jwt: identity_token,
                extended_ephemeral_public_key: keys::extended_public_key(&ephemeral.public_key),
                max_epoch: ephemeral.max_epoch,
                jwt_randomness: &ephemeral.randomness,
                salt: &salt,
                key_claim_name: &self.config.key_claim_name,
            })
            .await?;

        let session = AuthenticatedSession {
            identity_token: identity_token.to_string(),
            salt,
            address,
            max_epoch: ephemeral.max_epoch,
            proof,
            email: claims.email.clone(),
            logged_in_at: chrono::Utc::now().timestamp_millis(),
        };

        self.store.save_authenticated(&session)?;
        self.store.clear_ephemeral()?;
        self.context.set(session.clone()).await;
        Ok(session)
    }

    /// Restore a persisted session on process start.
    ///
    /// Returns the session if it is complete and not expired at
    /// `current_epoch`; otherwise clears the stale state and returns
    /// `None`.
    pub async fn restore_session(
        &self,
        current_epoch: u64,
    ) -> Result<Option<AuthenticatedSession>, SessionError> {
        let Some(session) = self.store.load_authenticated()? else {
            return Ok(None);
        };

        if session.is_valid_at(current_epoch) {
            info!(address = %session.address, max_epoch = session.max_epoch, "session restored");
            self.context.set(session.clone()).await;
            Ok(Some(session))
        } else {
            info!(current_epoch, max_epoch = session.max_epoch, "session expired or incomplete");
            self.store.clear_authenticated()?;
            self.context.clear().await;
            Ok(None)
        }
    }

    /// Log out: clears the authenticated session and any in-flight login
    /// attempt unconditionally.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.store.clear_ephemeral()?;
        self.store.clear_authenticated()?;
        self.context.clear().await;
        info!("logged out");
        Ok(())
    }

    /// Assemble a transaction-authorization signature from the session
    /// proof, the identity claims, and the caller's signature over the
    /// transaction bytes.
    pub async fn sign_for_transaction(
        &self,
        user_signature: &[u8],
    ) -> Result<TransactionAuthorization, SessionError> {
        let session = self
            .context
            .current()
            .await
            .ok_or(SessionError::SessionMissing("no authenticated session"))?;

        if session.proof.is_null() {
            return Err(SessionError::MissingProof);
        }

        let claims = extract_claims(&session.identity_token)?;
        let address_seed = compute_address_seed(
            &session.salt,
            &self.config.key_claim_name,
            &claims.sub,
            claims.aud.primary(),
        );

        let inputs = match session.proof {
            serde_json::Value::Object(mut map) => {
                map.insert("addressSeed".to_string(), address_seed.into());
                serde_json::Value::Object(map)
            }
            other => serde_json::json!({ "proof": other, "addressSeed": address_seed }),
        };

        Ok(TransactionAuthorization {
            inputs,
            max_epoch: session.max_epoch,
            user_signature: Base64::encode_string(user_signature),
        })
    }

    fn build_authorize_url(&self, nonce: &str) -> Result<String, SessionError> {
        let mut url = Url::parse(AUTHORIZE_ENDPOINT).map_err(|e| {
            SessionError::Config(ConfigError::InvalidValue {
                name: "AUTHORIZE_ENDPOINT",
                message: e.to_string(),
            })
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "id_token")
            .append_pair("scope", OAUTH_SCOPE)
            .append_pair("nonce", nonce)
            .append_pair("prompt", "select_account");
        Ok(url.into())
    }
}

/// Derive the account address from identity claims and the issued salt.
///
/// Pure function with no network I/O: the same token claims and salt always
/// produce the same address.
pub fn derive_address(claims: &IdClaims, salt: &str, key_claim_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key_claim_name.as_bytes());
    hasher.update([0x00]);
    hasher.update(claims.sub.as_bytes());
    hasher.update([0x00]);
    hasher.update(claims.aud.primary().as_bytes());
    hasher.update([0x00]);
    hasher.update(claims.iss.as_bytes());
    hasher.update([0x00]);
    hasher.update(salt.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// Address seed binding the salt to the key claim, for the transaction
/// signature inputs.
fn compute_address_seed(salt: &str, claim_name: &str, claim_value: &str, aud: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update([0x00]);
    hasher.update(claim_name.as_bytes());
    hasher.update([0x00]);
    hasher.update(claim_value.as_bytes());
    hasher.update([0x00]);
    hasher.update(aud.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::session::store::MemorySessionStore;
    use base64ct::{Base64UrlUnpadded, Encoding as _};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forge_token(sub: &str, aud: &str) -> String {
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = serde_json::json!({
            "sub": sub,
            "iss": "https://accounts.google.com",
            "aud": aud,
            "email": "user@example.com",
            "exp": 4_102_444_800i64,
        });
        let body = Base64UrlUnpadded::encode_string(payload.to_string().as_bytes());
        format!("{header}.{body}.c2ln")
    }

    fn test_config(salt_url: &str, prover_url: &str) -> AuthConfig {
        AuthConfig {
            client_id: "client-id-1".to_string(),
            redirect_uri: "http://localhost:5173/auth/callback".to_string(),
            salt_service_url: salt_url.to_string(),
            prover_url: prover_url.to_string(),
            key_claim_name: "sub".to_string(),
            max_epoch_offset: 10,
        }
    }

    async fn engine_with_mocks(
        server: &MockServer,
    ) -> SessionEngine<MemoryLedger, MemorySessionStore> {
        let ledger = MemoryLedger::new();
        ledger.set_epoch(100).await;
        SessionEngine::new(
            test_config(
                &format!("{}/get_salt", server.uri()),
                &format!("{}/v1", server.uri()),
            ),
            ledger,
            MemorySessionStore::new(),
            SessionContext::new(),
        )
        .expect("engine")
    }

    fn mount_salt_and_prover(server: &MockServer) -> (Mock, Mock) {
        let salt = Mock::given(method("POST")).and(path("/get_salt")).respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"salt": "4242"})),
        );
        let prover = Mock::given(method("POST")).and(path("/v1")).respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"proofPoints": {"a": ["1"]}})),
        );
        (salt, prover)
    }

    #[tokio::test]
    async fn begin_login_builds_redirect_and_awaits_callback() {
        let server = MockServer::start().await;
        let engine = engine_with_mocks(&server).await;

        assert_eq!(engine.state().await.unwrap(), LoginState::Unauthenticated);

        let request = engine.begin_login().await.unwrap();
        assert_eq!(request.max_epoch, 110);
        assert_eq!(engine.state().await.unwrap(), LoginState::AwaitingCallback);

        let url = Url::parse(&request.authorize_url).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-id-1"));
        assert_eq!(pairs.get("response_type").map(String::as_str), Some("id_token"));
        assert_eq!(pairs.get("nonce").map(String::as_str), Some(request.nonce.as_str()));
        assert_eq!(pairs.get("prompt").map(String::as_str), Some("select_account"));
    }

    #[tokio::test]
    async fn begin_login_requires_client_id() {
        let server = MockServer::start().await;
        let mut config = test_config(&server.uri(), &server.uri());
        config.client_id = String::new();
        let engine = SessionEngine::new(
            config,
            MemoryLedger::new(),
            MemorySessionStore::new(),
            SessionContext::new(),
        )
        .unwrap();

        let err = engine.begin_login().await.unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[tokio::test]
    async fn complete_login_promotes_session() {
        let server = MockServer::start().await;
        let (salt, prover) = mount_salt_and_prover(&server);
        salt.mount(&server).await;
        prover.mount(&server).await;

        let engine = engine_with_mocks(&server).await;
        engine.begin_login().await.unwrap();

        let token = forge_token("user-1", "client-id-1");
        let session = engine.complete_login(&token).await.unwrap();

        assert_eq!(session.salt, "4242");
        assert_eq!(session.max_epoch, 110);
        assert!(session.address.starts_with("0x"));
        assert!(session.is_valid_at(100));
        assert_eq!(engine.state().await.unwrap(), LoginState::Authenticated);

        // Ephemeral attempt is consumed exactly once.
        assert!(engine.store.load_ephemeral().unwrap().is_none());
        // Durable side carries the full session.
        assert!(engine.store.load_authenticated().unwrap().unwrap().is_complete());
    }

    #[tokio::test]
    async fn begin_login_while_authenticated_starts_fresh_flow() {
        let server = MockServer::start().await;
        let (salt, prover) = mount_salt_and_prover(&server);
        salt.mount(&server).await;
        prover.mount(&server).await;

        let engine = engine_with_mocks(&server).await;
        engine.begin_login().await.unwrap();
        let session = engine
            .complete_login(&forge_token("user-1", "client-id-1"))
            .await
            .unwrap();

        // A new flow can start without an implicit logout.
        let first = engine.begin_login().await.unwrap();
        assert!(engine.context.is_authenticated().await);
        assert_eq!(
            engine.context.current().await.map(|s| s.address),
            Some(session.address)
        );

        // Each call overwrites the prior in-flight attempt.
        let second = engine.begin_login().await.unwrap();
        assert_ne!(first.nonce, second.nonce);
        let attempt = engine.store.load_ephemeral().unwrap().unwrap();
        assert_eq!(attempt.nonce, second.nonce);
    }

    #[tokio::test]
    async fn complete_login_without_attempt_is_session_missing() {
        let server = MockServer::start().await;
        let engine = engine_with_mocks(&server).await;

        let token = forge_token("user-1", "client-id-1");
        let err = engine.complete_login(&token).await.unwrap_err();
        assert!(matches!(err, SessionError::SessionMissing(_)));
    }

    #[tokio::test]
    async fn complete_login_failure_leaves_no_partial_session() {
        let server = MockServer::start().await;
        // Salt succeeds, prover fails.
        Mock::given(method("POST"))
            .and(path("/get_salt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"salt": "4242"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("prover down"))
            .mount(&server)
            .await;

        let engine = engine_with_mocks(&server).await;
        engine.begin_login().await.unwrap();

        let token = forge_token("user-1", "client-id-1");
        let err = engine.complete_login(&token).await.unwrap_err();
        assert!(matches!(err, SessionError::ProofService(_)));

        assert_eq!(engine.state().await.unwrap(), LoginState::Unauthenticated);
        assert!(engine.store.load_authenticated().unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_login_rejects_garbage_token() {
        let server = MockServer::start().await;
        let engine = engine_with_mocks(&server).await;
        engine.begin_login().await.unwrap();

        let err = engine.complete_login("garbage").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn restore_session_honors_expiry() {
        let server = MockServer::start().await;
        let (salt, prover) = mount_salt_and_prover(&server);
        salt.mount(&server).await;
        prover.mount(&server).await;

        let engine = engine_with_mocks(&server).await;
        engine.begin_login().await.unwrap();
        engine
            .complete_login(&forge_token("user-1", "client-id-1"))
            .await
            .unwrap();

        // Still valid one epoch before expiry.
        assert!(engine.restore_session(109).await.unwrap().is_some());

        // Expired exactly at max_epoch; state is cleared.
        assert!(engine.restore_session(110).await.unwrap().is_none());
        assert_eq!(engine.state().await.unwrap(), LoginState::Unauthenticated);
        assert!(engine.store.load_authenticated().unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let server = MockServer::start().await;
        let (salt, prover) = mount_salt_and_prover(&server);
        salt.mount(&server).await;
        prover.mount(&server).await;

        let engine = engine_with_mocks(&server).await;
        engine.begin_login().await.unwrap();
        engine
            .complete_login(&forge_token("user-1", "client-id-1"))
            .await
            .unwrap();

        engine.logout().await.unwrap();
        assert_eq!(engine.state().await.unwrap(), LoginState::Unauthenticated);
        assert!(engine.store.load_authenticated().unwrap().is_none());
        assert!(engine.store.load_ephemeral().unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_for_transaction_attaches_address_seed() {
        let server = MockServer::start().await;
        let (salt, prover) = mount_salt_and_prover(&server);
        salt.mount(&server).await;
        prover.mount(&server).await;

        let engine = engine_with_mocks(&server).await;
        engine.begin_login().await.unwrap();
        engine
            .complete_login(&forge_token("user-1", "client-id-1"))
            .await
            .unwrap();

        let authorization = engine.sign_for_transaction(b"tx-signature").await.unwrap();
        assert_eq!(authorization.max_epoch, 110);
        assert!(authorization.inputs.get("addressSeed").is_some());
        assert!(authorization.inputs.get("proofPoints").is_some());
        assert_eq!(
            authorization.user_signature,
            Base64::encode_string(b"tx-signature")
        );
    }

    #[tokio::test]
    async fn sign_for_transaction_requires_proof() {
        let server = MockServer::start().await;
        let engine = engine_with_mocks(&server).await;

        // No session at all.
        let err = engine.sign_for_transaction(b"sig").await.unwrap_err();
        assert!(matches!(err, SessionError::SessionMissing(_)));

        // Session present but proof absent.
        let mut session = AuthenticatedSession {
            identity_token: forge_token("user-1", "client-id-1"),
            salt: "4242".to_string(),
            address: "0x1".to_string(),
            max_epoch: 110,
            proof: serde_json::json!({"ok": true}),
            email: None,
            logged_in_at: 0,
        };
        session.proof = serde_json::Value::Null;
        engine.context.set(session).await;
        let err = engine.sign_for_transaction(b"sig").await.unwrap_err();
        assert!(matches!(err, SessionError::MissingProof));
    }

    #[test]
    fn derive_address_is_pure() {
        let claims = IdClaims {
            sub: "user-1".to_string(),
            iss: "https://accounts.google.com".to_string(),
            aud: crate::session::claims::Audience::One("client-id-1".to_string()),
            email: None,
            exp: 0,
        };
        let a = derive_address(&claims, "4242", "sub");
        let b = derive_address(&claims, "4242", "sub");
        assert_eq!(a, b);
        assert_ne!(a, derive_address(&claims, "4243", "sub"));
        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 66);
    }
}

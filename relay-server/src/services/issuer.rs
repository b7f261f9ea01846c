//! Challenge issuance
//!
//! Builds a signed login-consent request, self-verifies it, registers the
//! challenge as pending, and renders the deeplink/QR forms for the client.
//! Self-verification is a hard gate: a request our own key cannot verify
//! would strand the wallet, so it never leaves the process.

use chrono::{Duration, Utc};
use ed25519_compact::{KeyPair, Seed};
use relay_common::types::{ChallengeRecord, LoginData};
use relay_common::{RelayError, Result};
use std::sync::Arc;
use tracing::{debug, error};
use verusid_login::{
    qr_data_url, to_deeplink, ChallengeId, LoginConsentChallenge, LoginConsentRequest,
    RedirectKind, RedirectUri, LOGIN_ACCESS,
};

use crate::config::Config;
use crate::store::ChallengeStore;

#[derive(Clone)]
pub struct ChallengeIssuer {
    keypair: Arc<KeyPair>,
    chain_id: String,
    signing_id: String,
    session_id: String,
    callback_url: String,
    ttl: Duration,
    store: Arc<dyn ChallengeStore>,
}

impl ChallengeIssuer {
    pub fn new(config: &Config, store: Arc<dyn ChallengeStore>) -> Result<Self> {
        let seed = Seed::from_slice(&config.signing_key)
            .map_err(|e| RelayError::ConfigError(format!("signing key seed: {e}")))?;
        Ok(Self {
            keypair: Arc::new(KeyPair::from_seed(seed)),
            chain_id: config.chain_id.clone(),
            signing_id: config.signing_id.clone(),
            session_id: config.chain_iaddress.clone(),
            callback_url: config.callback_url(),
            ttl: Duration::seconds(config.challenge_ttl_secs),
            store,
        })
    }

    /// Issue a fresh challenge and return its client-facing rendering
    pub async fn issue(&self) -> Result<LoginData> {
        let challenge_id = ChallengeId::generate();
        let created_at = Utc::now();
        let expires_at = created_at + self.ttl;

        let challenge = LoginConsentChallenge {
            challenge_id: challenge_id.clone(),
            requested_access: vec![LOGIN_ACCESS.to_string()],
            redirect_uris: vec![RedirectUri {
                uri: self.callback_url.clone(),
                kind: RedirectKind::Webhook,
            }],
            session_id: self.session_id.clone(),
            created_at,
        };

        let request = LoginConsentRequest::sign(
            self.chain_id.clone(),
            self.signing_id.clone(),
            challenge,
            &self.keypair.sk,
        )
        .map_err(|e| RelayError::SigningError(e.to_string()))?;

        // Sanity gate: verify our own freshly signed request before any
        // client sees it.
        if let Err(e) = request.verify(&self.keypair.pk) {
            error!(challenge_id = %challenge_id, error = %e, "self-verification of issued challenge failed");
            return Err(RelayError::InternalVerificationError(e.to_string()));
        }

        self.store
            .put(ChallengeRecord::pending(
                challenge_id.clone(),
                created_at,
                expires_at,
            ))
            .await?;

        let deeplink =
            to_deeplink(&request).map_err(|e| RelayError::InternalError(e.to_string()))?;
        let qr = qr_data_url(&deeplink).map_err(|e| RelayError::InternalError(e.to_string()))?;

        debug!(challenge_id = %challenge_id, %expires_at, "issued login challenge");

        Ok(LoginData {
            challenge_id,
            deeplink,
            qr_data_url: qr,
            expires_at,
        })
    }

    /// Public key the issued requests verify against
    pub fn public_key(&self) -> ed25519_compact::PublicKey {
        self.keypair.pk
    }
}

//! Response verification
//!
//! Accepts a wallet's signed login-consent response, verifies it against the
//! signing identity's chain-resolved key, and drives the challenge through its
//! one allowed transition. Verification is committed to the store before the
//! outcome reporter is spawned; downstream failures cannot un-verify a login.

use relay_common::types::ChallengeStatus;
use relay_common::{RelayError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;
use verusid_login::{IdentityClient, LoginConsentResponse};

use crate::services::reporter::OutcomeReporter;
use crate::store::{ChallengeStore, TransitionConflict};

#[derive(Clone)]
pub struct ResponseVerifier {
    identity: IdentityClient,
    store: Arc<dyn ChallengeStore>,
    reporter: OutcomeReporter,
}

impl ResponseVerifier {
    pub fn new(
        identity: IdentityClient,
        store: Arc<dyn ChallengeStore>,
        reporter: OutcomeReporter,
    ) -> Self {
        Self {
            identity,
            store,
            reporter,
        }
    }

    /// Handle a raw callback payload from a wallet. Success means the
    /// challenge is (or already was) verified; all failures are normalized
    /// into the relay taxonomy before reaching the HTTP layer.
    pub async fn handle(&self, payload: &[u8]) -> Result<()> {
        let response: LoginConsentResponse = serde_json::from_slice(payload)
            .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;
        response
            .validate()
            .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;

        // Chain lookup and signature check happen outside any store lock.
        let signing_key = self
            .identity
            .resolve_signing_key(&response.signing_id)
            .await
            .map_err(|e| RelayError::VerificationFailed(e.to_string()))?;
        response
            .verify(&signing_key)
            .map_err(|e| RelayError::VerificationFailed(e.to_string()))?;

        let challenge_id = response.challenge_id().clone();
        let signing_id = response.signing_id.clone();

        match self
            .store
            .transition(
                &challenge_id,
                ChallengeStatus::Verified,
                Some(signing_id.clone()),
            )
            .await
        {
            Ok(_) => {
                info!(challenge_id = %challenge_id, signing_id = %signing_id, "challenge verified");
                self.reporter.spawn_report(challenge_id, signing_id);
                Ok(())
            }
            // A retried callback for an already-verified challenge is a
            // success, but must not report again.
            Err(TransitionConflict::AlreadyResolved) => {
                debug!(challenge_id = %challenge_id, "duplicate response for resolved challenge");
                Ok(())
            }
            Err(TransitionConflict::Expired) | Err(TransitionConflict::NotFound) => {
                warn!(challenge_id = %challenge_id, "valid response for expired or unknown challenge");
                Err(RelayError::ChallengeExpiredOrUnknown)
            }
        }
    }
}

//! Login-consent requests and responses
//!
//! The request is the message a verifier hands to a wallet: "prove control of
//! an identity to log in here". The response carries the wallet's decision,
//! echoes the original request, and is signed by the wallet identity. Both
//! sides sign a SHA-256 digest of a domain-separated canonical serialization.

use chrono::{DateTime, Utc};
use ed25519_compact::{PublicKey, SecretKey, Signature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::challenge_id::ChallengeId;
use crate::error::{ProtocolError, Result};

/// Domain separation for request signatures
const REQUEST_SIGNING_PREFIX: &[u8] = b"verusid-login-consent-request-v1";

/// Domain separation for response signatures
const RESPONSE_SIGNING_PREFIX: &[u8] = b"verusid-login-consent-response-v1";

/// Access right requested from the wallet for a plain login
pub const LOGIN_ACCESS: &str = "identity.authentication.login";

/// How a wallet should deliver its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectKind {
    /// POST the signed response to this URI
    Webhook,

    /// Redirect the user agent to this URI
    Redirect,
}

/// Response delivery target embedded in a challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectUri {
    pub uri: String,
    pub kind: RedirectKind,
}

/// The unsigned core of a login-consent request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginConsentChallenge {
    /// Unique challenge identifier, echoed back by the wallet
    pub challenge_id: ChallengeId,

    /// Access rights the verifier asks the identity to consent to
    #[validate(length(min = 1))]
    pub requested_access: Vec<String>,

    /// Where the wallet sends its signed response
    #[validate(length(min = 1))]
    pub redirect_uris: Vec<RedirectUri>,

    /// Chain session identity (i-address) this login is scoped to
    pub session_id: String,

    /// Challenge creation time
    pub created_at: DateTime<Utc>,
}

/// A signed login-consent request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginConsentRequest {
    /// Target chain identifier
    #[validate(length(min = 1))]
    pub chain_id: String,

    /// Identity of the requesting service
    #[validate(length(min = 1))]
    pub signing_id: String,

    /// The challenge being signed
    pub challenge: LoginConsentChallenge,

    /// Base64 ed25519 signature over the signing digest
    #[validate(length(min = 1))]
    pub signature: String,
}

impl LoginConsentRequest {
    /// Build and sign a request with the service key
    pub fn sign(
        chain_id: impl Into<String>,
        signing_id: impl Into<String>,
        challenge: LoginConsentChallenge,
        key: &SecretKey,
    ) -> Result<Self> {
        let mut request = Self {
            chain_id: chain_id.into(),
            signing_id: signing_id.into(),
            challenge,
            signature: String::new(),
        };
        let digest = request.signing_digest()?;
        let signature = key.sign(digest, None);
        request.signature = crate::deeplink::b64_encode(signature.as_ref());
        Ok(request)
    }

    /// Verify the request signature against the service public key
    pub fn verify(&self, key: &PublicKey) -> Result<()> {
        let digest = self.signing_digest()?;
        let signature = decode_signature(&self.signature)?;
        key.verify(digest, &signature)
            .map_err(|e| ProtocolError::InvalidSignature(format!("request: {e}")))
    }

    fn signing_digest(&self) -> Result<[u8; 32]> {
        signing_digest(
            REQUEST_SIGNING_PREFIX,
            &self.chain_id,
            &self.signing_id,
            &serde_json::to_vec(&self.challenge)?,
        )
    }
}

/// The wallet's decision over a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConsentDecision {
    /// Wallet-assigned decision identifier
    pub decision_id: String,

    /// The original request, echoed verbatim
    pub request: LoginConsentRequest,

    /// Decision time as reported by the wallet
    pub created_at: DateTime<Utc>,
}

/// A signed login-consent response posted by the wallet
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginConsentResponse {
    /// Chain the signing identity lives on
    #[validate(length(min = 1))]
    pub chain_id: String,

    /// Identity that signed this response
    #[validate(length(min = 1))]
    pub signing_id: String,

    /// The embedded decision
    pub decision: LoginConsentDecision,

    /// Base64 ed25519 signature over the signing digest
    #[validate(length(min = 1))]
    pub signature: String,
}

impl LoginConsentResponse {
    /// Build and sign a response with a wallet key
    pub fn sign(
        chain_id: impl Into<String>,
        signing_id: impl Into<String>,
        decision: LoginConsentDecision,
        key: &SecretKey,
    ) -> Result<Self> {
        let mut response = Self {
            chain_id: chain_id.into(),
            signing_id: signing_id.into(),
            decision,
            signature: String::new(),
        };
        let digest = response.signing_digest()?;
        let signature = key.sign(digest, None);
        response.signature = crate::deeplink::b64_encode(signature.as_ref());
        Ok(response)
    }

    /// Verify the response signature against the wallet's public key
    pub fn verify(&self, key: &PublicKey) -> Result<()> {
        let digest = self.signing_digest()?;
        let signature = decode_signature(&self.signature)?;
        key.verify(digest, &signature)
            .map_err(|e| ProtocolError::InvalidSignature(format!("response: {e}")))
    }

    /// Challenge id this response answers
    pub fn challenge_id(&self) -> &ChallengeId {
        &self.decision.request.challenge.challenge_id
    }

    fn signing_digest(&self) -> Result<[u8; 32]> {
        signing_digest(
            RESPONSE_SIGNING_PREFIX,
            &self.chain_id,
            &self.signing_id,
            &serde_json::to_vec(&self.decision)?,
        )
    }
}

fn signing_digest(prefix: &[u8], chain_id: &str, signing_id: &str, body: &[u8]) -> Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(prefix);
    hasher.update(chain_id.as_bytes());
    hasher.update(signing_id.as_bytes());
    hasher.update(body);
    Ok(hasher.finalize().into())
}

fn decode_signature(encoded: &str) -> Result<Signature> {
    let bytes = crate::deeplink::b64_decode(encoded)
        .map_err(|e| ProtocolError::InvalidSignature(format!("signature encoding: {e}")))?;
    Signature::from_slice(&bytes)
        .map_err(|e| ProtocolError::InvalidSignature(format!("signature bytes: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use ed25519_compact::KeyPair;

    pub fn service_keypair() -> KeyPair {
        KeyPair::from_seed(ed25519_compact::Seed::new([7u8; 32]))
    }

    pub fn wallet_keypair() -> KeyPair {
        KeyPair::from_seed(ed25519_compact::Seed::new([9u8; 32]))
    }

    pub fn sample_challenge() -> LoginConsentChallenge {
        LoginConsentChallenge {
            challenge_id: ChallengeId::generate(),
            requested_access: vec![LOGIN_ACCESS.to_string()],
            redirect_uris: vec![RedirectUri {
                uri: "https://relay.example.com/verusidlogin".to_string(),
                kind: RedirectKind::Webhook,
            }],
            session_id: "iChainSession111111111111111111111".to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn signed_request() -> LoginConsentRequest {
        LoginConsentRequest::sign(
            "VRSC",
            "relay@",
            sample_challenge(),
            &service_keypair().sk,
        )
        .unwrap()
    }

    pub fn signed_response(request: LoginConsentRequest) -> LoginConsentResponse {
        let decision = LoginConsentDecision {
            decision_id: "decision-1".to_string(),
            request,
            created_at: Utc::now(),
        };
        LoginConsentResponse::sign("VRSC", "alice@", decision, &wallet_keypair().sk).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_request_sign_verify_round_trip() {
        let request = signed_request();
        assert!(request.verify(&service_keypair().pk).is_ok());
    }

    #[test]
    fn test_request_rejects_wrong_key() {
        let request = signed_request();
        assert!(request.verify(&wallet_keypair().pk).is_err());
    }

    #[test]
    fn test_request_rejects_tampered_challenge() {
        let mut request = signed_request();
        request.challenge.session_id = "iSomethingElse".to_string();
        assert!(request.verify(&service_keypair().pk).is_err());
    }

    #[test]
    fn test_response_sign_verify_round_trip() {
        let response = signed_response(signed_request());
        assert!(response.verify(&wallet_keypair().pk).is_ok());
    }

    #[test]
    fn test_response_rejects_tampered_decision() {
        let mut response = signed_response(signed_request());
        response.decision.decision_id = "decision-2".to_string();
        assert!(response.verify(&wallet_keypair().pk).is_err());
    }

    #[test]
    fn test_response_exposes_original_challenge_id() {
        let request = signed_request();
        let expected = request.challenge.challenge_id.clone();
        let response = signed_response(request);
        assert_eq!(*response.challenge_id(), expected);
    }

    #[test]
    fn test_response_json_round_trip() {
        let response = signed_response(signed_request());
        let json = serde_json::to_string(&response).unwrap();
        let back: LoginConsentResponse = serde_json::from_str(&json).unwrap();
        assert!(back.verify(&wallet_keypair().pk).is_ok());
    }
}

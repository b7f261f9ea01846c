//! Shared wire types for the login relay

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use verusid_login::ChallengeId;

/// Current state of an outstanding challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    /// Issued, awaiting a signed wallet response
    Pending,

    /// A valid signed response was accepted
    Verified,

    /// A response was rejected and the challenge closed
    Failed,

    /// TTL elapsed before a valid response arrived
    Expired,
}

impl ChallengeStatus {
    /// `verified` and `failed` are terminal; `expired` ends a pending
    /// challenge's lifetime as well.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Authoritative record of a single challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRecord {
    /// Challenge identifier, immutable after creation
    pub id: ChallengeId,

    /// Current status
    pub status: ChallengeStatus,

    /// Issuance time
    pub created_at: DateTime<Utc>,

    /// Issuance time plus TTL
    pub expires_at: DateTime<Utc>,

    /// Identity that signed the accepted response; set on `verified` only
    pub signing_id: Option<String>,

    /// True once the platform layer has acknowledged the outcome
    pub reported: bool,
}

impl ChallengeRecord {
    /// New pending record for a freshly issued challenge
    pub fn pending(id: ChallengeId, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: ChallengeStatus::Pending,
            created_at,
            expires_at,
            signing_id: None,
            reported: false,
        }
    }

    /// Whether the TTL has elapsed relative to `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Success envelope used by all data-bearing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiData<T> {
    pub data: T,
}

impl<T> ApiData<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Response body for `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    /// Challenge identifier for status polling
    pub challenge_id: ChallengeId,

    /// Canonical deeplink form of the login-consent request
    pub deeplink: String,

    /// The deeplink rendered as a QR code data URL
    pub qr_data_url: String,

    /// When the challenge stops being answerable
    pub expires_at: DateTime<Utc>,
}

/// Response body for `GET /status/{challenge_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub status: ChallengeStatus,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_id: Option<String>,
}

/// Outbound payload for the platform session callback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCallback {
    pub challenge_id: ChallengeId,

    pub signing_id: String,

    pub verified: bool,
}

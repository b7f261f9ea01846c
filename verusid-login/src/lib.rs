//! VerusID login-consent protocol adapter
//!
//! Builds and verifies signed login-consent requests and responses, generates
//! challenge identifiers, renders deeplinks/QR data URLs, and resolves wallet
//! identities against a chain API. The relay core depends on this crate for
//! everything protocol-shaped; it never touches signature bytes itself.

pub mod challenge_id;
pub mod consent;
pub mod deeplink;
pub mod error;
pub mod identity;

pub use challenge_id::ChallengeId;
pub use consent::{
    LoginConsentChallenge, LoginConsentDecision, LoginConsentRequest, LoginConsentResponse,
    RedirectKind, RedirectUri, LOGIN_ACCESS,
};
pub use deeplink::{from_deeplink, qr_data_url, to_deeplink};
pub use error::{ProtocolError, Result};
pub use identity::{IdentityClient, IdentityInfo};

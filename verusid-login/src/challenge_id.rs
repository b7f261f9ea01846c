//! Challenge identifiers
//!
//! A challenge id is 20 bytes of OS randomness, base58check-encoded with the
//! identity address version byte. 160 random bits make collisions negligible;
//! the checksum rejects truncated or mistyped ids before any store lookup.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Identity address version byte; encoded ids start with `i`.
const ADDRESS_VERSION: u8 = 102;

/// Number of random payload bytes in an id
const PAYLOAD_LEN: usize = 20;

/// Opaque unique identifier of a single login challenge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChallengeId(String);

impl ChallengeId {
    /// Generate a fresh id from the OS random source
    pub fn generate() -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        OsRng.fill_bytes(&mut payload);
        let encoded = bs58::encode(payload)
            .with_check_version(ADDRESS_VERSION)
            .into_string();
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChallengeId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .with_check(Some(ADDRESS_VERSION))
            .into_vec()
            .map_err(|e| ProtocolError::InvalidChallengeId(e.to_string()))?;
        // with_check keeps the version byte at index 0
        if decoded.len() != PAYLOAD_LEN + 1 {
            return Err(ProtocolError::InvalidChallengeId(format!(
                "unexpected payload length {}",
                decoded.len() - 1
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ChallengeId {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChallengeId> for String {
    fn from(id: ChallengeId) -> Self {
        id.0
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

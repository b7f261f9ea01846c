//! Relay configuration
//!
//! All configuration comes from the environment at startup and is passed to
//! component constructors explicitly; nothing reads env vars after boot.

use relay_common::{RelayError, Result};
use std::env;

#[derive(Clone)]
pub struct Config {
    /// Ed25519 seed for the service signing key (32 bytes)
    pub signing_key: Vec<u8>,

    /// Identity the service signs requests as, e.g. `relay@`
    pub signing_id: String,

    /// Target chain identifier, e.g. `VRSC`
    pub chain_id: String,

    /// Chain API endpoint for identity resolution
    pub chain_api_url: String,

    /// Chain session i-address embedded in issued challenges
    pub chain_iaddress: String,

    /// Platform session layer base URL for outcome callbacks
    pub platform_internal_url: String,

    /// Public base URL of this relay, used for the wallet webhook
    pub public_url: String,

    /// Listen port
    pub port: u16,

    /// Challenge TTL in seconds
    pub challenge_ttl_secs: i64,

    /// Grace period past TTL before a record is swept, in seconds
    pub sweep_grace_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let signing_key = hex::decode(require("VERUS_SIGNING_KEY")?)
            .map_err(|e| RelayError::ConfigError(format!("VERUS_SIGNING_KEY: {e}")))?;
        if signing_key.len() != 32 {
            return Err(RelayError::ConfigError(format!(
                "VERUS_SIGNING_KEY must be a 32-byte hex seed, got {} bytes",
                signing_key.len()
            )));
        }

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| RelayError::ConfigError(format!("PORT: {e}")))?;

        Ok(Self {
            signing_key,
            signing_id: require("VERUS_SIGNING_ID")?,
            chain_id: env::var("VERUS_CHAIN").unwrap_or_else(|_| "VRSC".to_string()),
            chain_api_url: require("VERUS_CHAIN_API")?,
            chain_iaddress: require("VERUS_CHAIN_IADDRESS")?,
            platform_internal_url: require("PLATFORM_INTERNAL_URL")?,
            public_url: env::var("RELAY_PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://127.0.0.1:{port}")),
            port,
            challenge_ttl_secs: parse_secs("CHALLENGE_TTL_SECS", 300)?,
            sweep_grace_secs: parse_secs("SWEEP_GRACE_SECS", 60)?,
        })
    }

    /// Public endpoint the wallet posts signed responses to
    pub fn callback_url(&self) -> String {
        format!("{}/verusidlogin", self.public_url.trim_end_matches('/'))
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).map_err(|_| RelayError::ConfigError(format!("{name} must be set")))
}

fn parse_secs(name: &str, default: i64) -> Result<i64> {
    match env::var(name) {
        Ok(raw) => {
            let secs: i64 = raw
                .parse()
                .map_err(|e| RelayError::ConfigError(format!("{name}: {e}")))?;
            if secs <= 0 {
                return Err(RelayError::ConfigError(format!("{name} must be positive")));
            }
            Ok(secs)
        }
        Err(_) => Ok(default),
    }
}

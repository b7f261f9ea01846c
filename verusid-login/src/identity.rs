//! Chain identity resolution
//!
//! HTTP client for the chain API's JSON-RPC interface. Used to resolve a
//! response's signing identity to its primary key before signature
//! verification. All transport and RPC failures normalize into
//! `ProtocolError::IdentityResolution`.

use ed25519_compact::PublicKey;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ProtocolError, Result};

#[derive(Clone)]
pub struct IdentityClient {
    api_url: String,
    client: reqwest::Client,
}

impl IdentityClient {
    /// Build a client against a chain API endpoint with a bounded per-call
    /// timeout.
    pub fn new(api_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProtocolError::IdentityResolution(format!("client: {e}")))?;
        Ok(Self { api_url, client })
    }

    /// Look up an identity by name or i-address
    pub async fn get_identity(&self, identity: &str) -> Result<IdentityInfo> {
        let body = serde_json::json!({
            "jsonrpc": "1.0",
            "id": "login-relay",
            "method": "getidentity",
            "params": [identity],
        });

        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProtocolError::IdentityResolution(format!("chain api: {e}")))?;

        if !response.status().is_success() {
            return Err(ProtocolError::IdentityResolution(format!(
                "chain api returned {}",
                response.status()
            )));
        }

        let envelope = response
            .json::<RpcEnvelope>()
            .await
            .map_err(|e| ProtocolError::IdentityResolution(format!("chain api body: {e}")))?;

        if let Some(error) = envelope.error {
            return Err(ProtocolError::IdentityResolution(format!(
                "rpc error {}: {}",
                error.code, error.message
            )));
        }

        envelope
            .result
            .ok_or_else(|| ProtocolError::IdentityResolution("empty rpc result".to_string()))
    }

    /// Resolve an identity's primary signing key
    pub async fn resolve_signing_key(&self, identity: &str) -> Result<PublicKey> {
        let info = self.get_identity(identity).await?;
        info.primary_signing_key()
    }
}

/// Identity record returned by `getidentity`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityInfo {
    /// The identity's i-address
    #[serde(rename = "identityaddress")]
    pub identity_address: String,

    /// Human-readable name, e.g. `alice@`
    #[serde(rename = "friendlyname")]
    pub friendly_name: String,

    /// Hex-encoded primary ed25519 key
    #[serde(rename = "primarykey")]
    pub primary_key: String,
}

impl IdentityInfo {
    pub fn primary_signing_key(&self) -> Result<PublicKey> {
        let bytes = hex::decode(&self.primary_key)
            .map_err(|e| ProtocolError::IdentityResolution(format!("primary key hex: {e}")))?;
        PublicKey::from_slice(&bytes)
            .map_err(|e| ProtocolError::IdentityResolution(format!("primary key: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<IdentityInfo>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

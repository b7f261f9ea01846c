//! Error types for the login-consent protocol

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Protocol-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Challenge id failed checksum or version validation
    #[error("Invalid challenge id: {0}")]
    InvalidChallengeId(String),

    /// Signing with the service key failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A signature did not verify against the expected key
    #[error("Signature verification failed: {0}")]
    InvalidSignature(String),

    /// Payload could not be decoded into a protocol structure
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Deeplink or QR encoding failed
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Chain API lookup of an identity failed
    #[error("Identity resolution failed: {0}")]
    IdentityResolution(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Error types for the login relay

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Challenge signing failed: {0}")]
    SigningError(String),

    #[error("Self-verification of issued challenge failed: {0}")]
    InternalVerificationError(String),

    #[error("Malformed login response: {0}")]
    MalformedResponse(String),

    #[error("Login response verification failed: {0}")]
    VerificationFailed(String),

    #[error("Challenge expired or unknown")]
    ChallengeExpiredOrUnknown,

    #[error("Challenge not found")]
    NotFound,

    #[error("Duplicate challenge id: {0}")]
    DuplicateId(String),

    #[error("Outcome reporting failed: {0}")]
    ReportingFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl actix_web::error::ResponseError for RelayError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::http::StatusCode;
        use actix_web::HttpResponse;

        let status = match self {
            Self::MalformedResponse(_)
            | Self::VerificationFailed(_)
            | Self::ChallengeExpiredOrUnknown => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

use thiserror::Error;

use crate::types::JobStatus;

/// Error type for the proof job orchestrator.
#[derive(Debug, Error)]
pub enum Error {
    // --- Orchestration errors ---
    #[error("Unsupported proof type: {0}")]
    UnsupportedProofType(String),

    #[error("Proof job not found: {0}")]
    NotFound(String),

    #[error("Duplicate job id: {0}")]
    DuplicateId(String),

    #[error("Illegal status transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Verification failed: {0}")]
    VerificationError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // --- Configuration & IO ---
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration parsing error (TOML): {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error (JSON): {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlParseError(#[from] url::ParseError),

    // --- Client side ---
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Could not acquire lock: {0}")]
    LockError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::LockError(format!("Mutex/RwLock poisoned: {}", e))
    }
}

impl Error {
    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedProofType(_) => "UNSUPPORTED_PROOF_TYPE",
            Error::NotFound(_) => "NOT_FOUND",
            Error::DuplicateId(_) => "DUPLICATE_ID",
            Error::InvalidTransition { .. } => "INVALID_TRANSITION",
            Error::BackendError(_) => "BACKEND_ERROR",
            Error::VerificationError(_) => "VERIFICATION_ERROR",
            Error::Timeout(_) => "TIMEOUT",
            Error::InvalidRequest(_) => "INVALID_REQUEST",
            Error::ConfigError(_) | Error::TomlError(_) => "CONFIG_ERROR",
            Error::LockError(_) => "LOCK_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

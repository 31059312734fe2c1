//! Error types for jwtgate
//!
//! Every variant renders to the exact message returned to HTTP callers, so
//! `to_string()` is safe to put on the wire. Internal causes stay in the
//! `source` chain and are only logged.

use thiserror::Error;

/// A blank or missing request field, detected before any lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}': must not be blank.")]
    Blank(&'static str),
}

/// Credential and bearer-token rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    /// Unknown organisation or wrong access key. The two cases are never
    /// distinguished.
    #[error("Invalid organisation_uid or access_key")]
    InvalidCredential,
    #[error("Access token is missing")]
    TokenMissing,
    /// Malformed token or signature mismatch.
    #[error("Access token is invalid")]
    TokenInvalid,
    #[error("Access token expired")]
    TokenExpired,
}

/// The credential store could not answer.
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("Service unavailable")]
    Timeout,
    #[error("Service unavailable")]
    Unavailable(#[source] StoreError),
}

/// Failures inside a credential store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] heed::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupted record for '{organisation_uid}': {source}")]
    Corrupted {
        organisation_uid: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("random source failed: {0}")]
    Random(getrandom::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Top-level error for issuer and verifier operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    /// Claim serialization failed. Not expected for well-formed claims.
    #[error("Internal server error")]
    Encoding(#[source] serde_json::Error),
}

impl Error {
    /// Stable HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Authentication(_) => 401,
            Error::Dependency(_) => 503,
            Error::Encoding(_) => 500,
        }
    }
}

/// Result type alias for jwtgate operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_wire_exact() {
        assert_eq!(ValidationError::Blank("organisation_uid").to_string(), "'organisation_uid': must not be blank.");
        assert_eq!(ValidationError::Blank("access_key").to_string(), "'access_key': must not be blank.");
        assert_eq!(Error::from(AuthenticationError::InvalidCredential).to_string(), "Invalid organisation_uid or access_key");
        assert_eq!(Error::from(AuthenticationError::TokenMissing).to_string(), "Access token is missing");
        assert_eq!(Error::from(AuthenticationError::TokenInvalid).to_string(), "Access token is invalid");
        assert_eq!(Error::from(AuthenticationError::TokenExpired).to_string(), "Access token expired");
        assert_eq!(Error::from(DependencyError::Timeout).to_string(), "Service unavailable");
    }

    #[test]
    fn status_codes() {
        assert_eq!(Error::from(ValidationError::Blank("access_key")).status_code(), 400);
        assert_eq!(Error::from(AuthenticationError::TokenExpired).status_code(), 401);
        assert_eq!(Error::from(DependencyError::Timeout).status_code(), 503);
    }
}

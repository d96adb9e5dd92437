use http::StatusCode;
use thiserror::Error;

use crate::cache::store::StoreError;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("token store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("token issuance failed: {message}")]
    Issuance {
        status: Option<StatusCode>,
        body: Option<String>,
        message: String,
    },

    #[error("resource API rejected the bearer token (401)")]
    AuthorizationFailure { body: Option<String> },

    #[error("resource API request failed: {message}")]
    Request {
        status: Option<StatusCode>,
        body: Option<String>,
        message: String,
    },
}

impl CredentialError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CredentialError::Issuance { status, .. } | CredentialError::Request { status, .. } => *status,
            CredentialError::AuthorizationFailure { .. } => Some(StatusCode::UNAUTHORIZED),
            CredentialError::StoreUnavailable(_) => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            CredentialError::Issuance { body, .. }
            | CredentialError::Request { body, .. }
            | CredentialError::AuthorizationFailure { body } => body.as_deref(),
            CredentialError::StoreUnavailable(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CredentialError::AuthorizationFailure { .. })
    }
}

pub type CredentialResult<T> = Result<T, CredentialError>;

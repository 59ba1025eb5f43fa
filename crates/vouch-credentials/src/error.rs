use vouch_core::CoreError;
use vouch_identity::IdentityError;

/// Credential engine errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("DID resolution failed: {0}")]
    ResolutionFailure(String),

    #[error("resolution timed out: {0}")]
    ResolutionTimeout(String),

    #[error("disclosure token does not match any digest: {0}")]
    TokenMismatch(String),

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("signing failed: {0}")]
    SigningFailure(String),

    #[error("replay mismatch: {0}")]
    ReplayMismatch(String),

    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    #[error("duplicate credential: {0}")]
    DuplicateCredential(String),

    #[error("malformed presentation: {0}")]
    MalformedPresentation(String),

    #[error("invalid status transition: {0}")]
    InvalidStatus(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] vouch_crypto::CryptoError),

    #[error("identity error: {0}")]
    Identity(IdentityError),
}

impl From<CoreError> for CredentialError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedIdentifier(msg) => Self::MalformedIdentifier(msg),
            CoreError::InvalidStateTransition { .. } => Self::InvalidStatus(err.to_string()),
            other => Self::SchemaViolation(other.to_string()),
        }
    }
}

impl From<IdentityError> for CredentialError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MalformedIdentifier(msg) => Self::MalformedIdentifier(msg),
            IdentityError::ResolutionTimeout(did) => Self::ResolutionTimeout(did),
            IdentityError::DidNotFound(did) => {
                Self::ResolutionFailure(format!("DID not found: {}", did))
            }
            IdentityError::DidResolution(msg) => Self::ResolutionFailure(msg),
            other => Self::Identity(other),
        }
    }
}

impl From<serde_json::Error> for CredentialError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("DID not found: {0}")]
    DidNotFound(String),

    #[error("DID resolution failed: {0}")]
    DidResolution(String),

    #[error("resolution timed out: {0}")]
    ResolutionTimeout(String),

    #[error("duplicate DID: {0}")]
    DuplicateDid(String),

    #[error("verification method not found: {0}")]
    VerificationMethodNotFound(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] vouch_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<vouch_core::CoreError> for IdentityError {
    fn from(err: vouch_core::CoreError) -> Self {
        match err {
            vouch_core::CoreError::MalformedIdentifier(msg) => Self::MalformedIdentifier(msg),
            other => Self::DidResolution(other.to_string()),
        }
    }
}

/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("disclosure digest not found in envelope: {0}")]
    DigestMismatch(String),
}

use ed25519_dalek::Signer;
use ed25519_dalek::Verifier;

use crate::error::CryptoError;
use crate::hashing::{b64url_decode, b64url_encode};
use crate::keys::{KeyPair, PublicKey};

/// Ed25519 signature (64 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

impl Signature {
    /// Get the raw bytes (64 bytes).
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }

    /// Create from raw bytes (64 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!("signature must be 64 bytes, got {}", bytes.len()))
        })?;
        let inner = ed25519_dalek::Signature::from_bytes(&bytes_arr);
        Ok(Self { inner })
    }

    /// Encode as multibase base58btc (`z...`), the data-integrity `proofValue` form.
    pub fn to_multibase(&self) -> String {
        format!("z{}", bs58::encode(self.to_bytes()).into_string())
    }

    /// Decode a multibase base58btc `proofValue`.
    pub fn from_multibase(value: &str) -> Result<Self, CryptoError> {
        let encoded = value.strip_prefix('z').ok_or_else(|| {
            CryptoError::Encoding("proof value is not multibase base58btc".into())
        })?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CryptoError::Encoding(format!("invalid base58: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Encode as unpadded base64url, the compact JWS form.
    pub fn to_b64url(&self) -> String {
        b64url_encode(self.to_bytes())
    }

    /// Decode an unpadded base64url signature segment.
    pub fn from_b64url(value: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&b64url_decode(value)?)
    }
}

/// Sign a message using Ed25519.
pub fn sign(message: &[u8], keypair: &KeyPair) -> Signature {
    let sig = keypair.signing_key().sign(message);
    Signature { inner: sig }
}

/// Verify an Ed25519 signature.
pub fn verify(
    message: &[u8],
    signature: &Signature,
    pubkey: &PublicKey,
) -> Result<(), CryptoError> {
    pubkey
        .verifying_key()
        .verify(message, &signature.inner)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// SHA-256 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA-256 of an ASCII string, encoded as unpadded base64url.
///
/// This is the digest format used for SD disclosure tokens (`_sd_alg: sha-256`).
pub fn digest_b64url(data: &str) -> String {
    b64url_encode(sha256(data.as_bytes()))
}

/// Unpadded base64url encoding.
pub fn b64url_encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Unpadded base64url decoding.
pub fn b64url_decode(data: &str) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| CryptoError::Encoding(format!("invalid base64url: {}", e)))
}

fn random_b64url<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    b64url_encode(bytes)
}

/// Fresh 128-bit disclosure salt.
pub fn random_salt() -> String {
    random_b64url::<16>()
}

/// Fresh 256-bit authorization challenge.
pub fn random_challenge() -> String {
    random_b64url::<32>()
}

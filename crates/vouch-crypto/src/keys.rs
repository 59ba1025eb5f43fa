use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Multibase prefix for base58btc.
const MULTIBASE_BASE58BTC: char = 'z';

/// Ed25519 key pair for signing operations.
/// Private key material is zeroized on drop by `ed25519-dalek`.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create a key pair from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        Ok(kp)
    }

    /// Create a key pair from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(seed_hex.trim())
            .map_err(|e| CryptoError::InvalidInput(format!("invalid seed hex: {}", e)))?;
        let kp = Self::from_bytes(&bytes);
        bytes.zeroize();
        kp
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Get the raw private key bytes (32 bytes).
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Hex-encoded seed, suitable for a config file.
    pub fn seed_hex(&self) -> String {
        hex::encode(self.secret_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key().to_multibase())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key for verification operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Create from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        let verifying_key = VerifyingKey::from_bytes(&bytes_arr)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    /// Get the raw bytes (32 bytes).
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    /// Encode as base58.
    pub fn to_bs58(&self) -> String {
        bs58::encode(self.as_bytes()).into_string()
    }

    /// Decode from base58.
    pub fn from_bs58(bs58_str: &str) -> Result<Self, CryptoError> {
        let bytes = bs58::decode(bs58_str)
            .into_vec()
            .map_err(|e| CryptoError::InvalidInput(format!("invalid base58: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Encode as a multibase (base58btc, `z` prefix) string.
    pub fn to_multibase(&self) -> String {
        format!("{}{}", MULTIBASE_BASE58BTC, self.to_bs58())
    }

    /// Decode from a multibase (base58btc) string.
    pub fn from_multibase(multibase: &str) -> Result<Self, CryptoError> {
        let encoded = multibase.strip_prefix(MULTIBASE_BASE58BTC).ok_or_else(|| {
            CryptoError::InvalidInput(format!("unsupported multibase prefix: {}", multibase))
        })?;
        Self::from_bs58(encoded)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair() {
        let kp = KeyPair::generate();
        let pk = kp.public_key();
        assert_eq!(pk.as_bytes().len(), 32);
    }

    #[test]
    fn test_from_seed_deterministic() {
        let seed = [42u8; 32];
        let kp1 = KeyPair::from_seed(&seed);
        let kp2 = KeyPair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_from_bytes_invalid_length() {
        let result = KeyPair::from_bytes(&[0u8; 16]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_seed_hex_restores_same_key() {
        let kp = KeyPair::generate();
        let restored = KeyPair::from_seed_hex(&kp.seed_hex()).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn test_seed_hex_invalid() {
        assert!(KeyPair::from_seed_hex("not-hex").is_err());
        assert!(KeyPair::from_seed_hex("abcd").is_err());
    }

    #[test]
    fn test_public_key_multibase() {
        let pk = KeyPair::from_seed(&[7u8; 32]).public_key();
        let mb = pk.to_multibase();
        assert!(mb.starts_with('z'));
        assert_eq!(PublicKey::from_multibase(&mb).unwrap(), pk);
    }

    #[test]
    fn test_public_key_multibase_wrong_prefix() {
        let pk = KeyPair::generate().public_key();
        let result = PublicKey::from_multibase(&format!("m{}", pk.to_bs58()));
        assert!(result.is_err());
    }

    #[test]
    fn test_public_key_from_bytes_invalid() {
        let result = PublicKey::from_bytes(&[0u8; 31]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let debug = format!("{:?}", kp);
        assert!(!debug.contains(&kp.seed_hex()));
        assert!(debug.contains("public_key"));
    }

    #[test]
    fn test_different_seeds_different_keys() {
        let kp1 = KeyPair::from_seed(&[1u8; 32]);
        let kp2 = KeyPair::from_seed(&[2u8; 32]);
        assert_ne!(kp1.public_key(), kp2.public_key());
    }
}

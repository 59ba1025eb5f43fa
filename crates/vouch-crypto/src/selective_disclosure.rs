use serde_json::Value;

use crate::error::CryptoError;
use crate::hashing::{b64url_decode, b64url_encode, digest_b64url, random_salt};

/// A single salted claim disclosure.
///
/// The token is the base64url encoding of the JSON array
/// `[salt, claim_name, claim_value]`; its digest is SHA-256 over the token's
/// ASCII bytes. Decoding keeps the token exactly as presented so the digest
/// is always computed over what the holder sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Disclosure {
    salt: String,
    claim_name: String,
    value: Value,
    encoded: String,
}

impl Disclosure {
    /// Create a disclosure with a fresh random salt.
    pub fn new(claim_name: impl Into<String>, value: Value) -> Result<Self, CryptoError> {
        Self::with_salt(random_salt(), claim_name, value)
    }

    /// Create a disclosure with a caller-supplied salt.
    pub fn with_salt(
        salt: impl Into<String>,
        claim_name: impl Into<String>,
        value: Value,
    ) -> Result<Self, CryptoError> {
        let salt = salt.into();
        let claim_name = claim_name.into();
        let array = Value::Array(vec![
            Value::String(salt.clone()),
            Value::String(claim_name.clone()),
            value.clone(),
        ]);
        let json = serde_json::to_string(&array)
            .map_err(|e| CryptoError::Encoding(format!("disclosure encoding: {}", e)))?;
        Ok(Self {
            salt,
            claim_name,
            value,
            encoded: b64url_encode(json),
        })
    }

    /// Decode a disclosure token.
    pub fn decode(token: &str) -> Result<Self, CryptoError> {
        let bytes = b64url_decode(token)?;
        let parsed: Value = serde_json::from_slice(&bytes)
            .map_err(|e| CryptoError::Encoding(format!("disclosure is not JSON: {}", e)))?;

        let items = match parsed {
            Value::Array(items) if items.len() == 3 => items,
            _ => {
                return Err(CryptoError::Encoding(
                    "disclosure must be a 3-element array".into(),
                ))
            }
        };
        let mut items = items.into_iter();
        let (salt, name, value) = match (items.next(), items.next(), items.next()) {
            (Some(Value::String(salt)), Some(Value::String(name)), Some(value)) => {
                (salt, name, value)
            }
            _ => {
                return Err(CryptoError::Encoding(
                    "disclosure salt and claim name must be strings".into(),
                ))
            }
        };

        Ok(Self {
            salt,
            claim_name: name,
            value,
            encoded: token.to_string(),
        })
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn claim_name(&self) -> &str {
        &self.claim_name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The opaque token handed to the holder.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// SHA-256 digest of the token (base64url).
    pub fn digest(&self) -> String {
        digest_b64url(&self.encoded)
    }

    /// Decode a presented token and require its digest to be listed.
    pub fn verify_against(token: &str, digests: &[String]) -> Result<Self, CryptoError> {
        let disclosure = Self::decode(token)?;
        let digest = disclosure.digest();
        if !digests.iter().any(|d| *d == digest) {
            return Err(CryptoError::DigestMismatch(disclosure.claim_name));
        }
        Ok(disclosure)
    }
}

/// Ordered set of salted claim disclosures.
///
/// Each claim is salted and hashed individually, allowing the holder to
/// reveal only chosen claims while the signed envelope commits to all of
/// them through the digest list.
#[derive(Debug, Clone, Default)]
pub struct SelectiveDisclosure {
    disclosures: Vec<Disclosure>,
}

impl SelectiveDisclosure {
    /// Create a new empty selective disclosure set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a claim. Returns the digest committed to for this claim.
    pub fn add_claim(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<String, CryptoError> {
        let disclosure = Disclosure::new(name, value)?;
        let digest = disclosure.digest();
        self.disclosures.push(disclosure);
        Ok(digest)
    }

    /// Digests in insertion order.
    pub fn digests(&self) -> Vec<String> {
        self.disclosures.iter().map(Disclosure::digest).collect()
    }

    /// Encoded tokens in insertion order.
    pub fn tokens(&self) -> Vec<String> {
        self.disclosures
            .iter()
            .map(|d| d.encoded().to_string())
            .collect()
    }

    /// Look up the disclosure for a claim.
    pub fn disclosure_for(&self, name: &str) -> Option<&Disclosure> {
        self.disclosures.iter().find(|d| d.claim_name() == name)
    }

    pub fn len(&self) -> usize {
        self.disclosures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disclosures.is_empty()
    }
}

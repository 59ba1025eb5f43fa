use serde::{Deserialize, Serialize};
use vouch_crypto::PublicKey;

use crate::error::IdentityError;

pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
pub const PRIMARY_KEY_FRAGMENT: &str = "key-1";
pub const ED25519_KEY_TYPE: &str = "Ed25519VerificationKey2020";

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// DID URL of the key (e.g., "did:web:example.com#key-1").
    pub id: String,
    /// Key type (e.g., "Ed25519VerificationKey2020").
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this key.
    pub controller: String,
    /// Multibase (base58btc) public key.
    pub public_key_multibase: String,
}

impl VerificationMethod {
    /// Decode the key material.
    pub fn public_key(&self) -> Result<PublicKey, IdentityError> {
        Ok(PublicKey::from_multibase(&self.public_key_multibase)?)
    }
}

/// W3C DID Document.
///
/// Verification relationships (`authentication`, `assertionMethod`,
/// `keyAgreement`) reference verification methods by DID URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default)]
    pub context: Vec<String>,
    pub id: String,
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub authentication: Vec<String>,
    #[serde(default)]
    pub assertion_method: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<String>,
}

impl DidDocument {
    /// Create a document with a single Ed25519 key usable for
    /// authentication and assertion.
    pub fn new(id: impl Into<String>, public_key: &PublicKey) -> Self {
        let id = id.into();
        let key_id = format!("{}#{}", id, PRIMARY_KEY_FRAGMENT);
        let vm = VerificationMethod {
            id: key_id.clone(),
            method_type: ED25519_KEY_TYPE.to_string(),
            controller: id.clone(),
            public_key_multibase: public_key.to_multibase(),
        };
        Self {
            context: vec![DID_CONTEXT.to_string()],
            id,
            verification_method: vec![vm],
            authentication: vec![key_id.clone()],
            assertion_method: vec![key_id],
            key_agreement: Vec::new(),
        }
    }

    /// Find a verification method by its full DID URL.
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// The DID URLs authorised for a proof purpose. Unknown purposes have none.
    pub fn relationship(&self, purpose: &str) -> &[String] {
        match purpose {
            "authentication" => self.authentication.as_slice(),
            "assertionMethod" => self.assertion_method.as_slice(),
            "keyAgreement" => self.key_agreement.as_slice(),
            _ => &[],
        }
    }

    /// Whether `method_id` may be used for `purpose`.
    pub fn is_authorized(&self, method_id: &str, purpose: &str) -> bool {
        self.relationship(purpose).iter().any(|r| r == method_id)
    }

    /// Primary public key, multibase encoded.
    pub fn primary_public_key_multibase(&self) -> Option<&str> {
        self.verification_method
            .first()
            .map(|vm| vm.public_key_multibase.as_str())
    }
}

use dashmap::DashMap;
use vouch_core::{validate_did, Did};
use vouch_crypto::{KeyPair, PublicKey};

use crate::document::DidDocument;
use crate::error::IdentityError;

/// DID method name used for locally minted identifiers.
pub const VOUCH_METHOD: &str = "vouch";

/// Prefix of self-certifying key DIDs: `did:vouch:key:<bs58 pubkey>`.
pub const KEY_DID_PREFIX: &str = "did:vouch:key:";

/// Self-certifying DID for a public key.
pub fn key_did(public_key: &PublicKey) -> String {
    format!("{}{}", KEY_DID_PREFIX, public_key.to_bs58())
}

/// Recover the public key embedded in a key DID.
pub fn public_key_from_key_did(did: &str) -> Result<PublicKey, IdentityError> {
    validate_did(did)?;
    let encoded = did
        .strip_prefix(KEY_DID_PREFIX)
        .ok_or_else(|| IdentityError::DidNotFound(did.to_string()))?;
    PublicKey::from_bs58(encoded)
        .map_err(|e| IdentityError::DidResolution(format!("{}: {}", did, e)))
}

/// Manages DID creation, storage, and resolution.
///
/// Uses an in-memory `DashMap` as the local DID document store.
pub struct DidManager {
    /// DID URI -> DidDocument
    store: DashMap<String, DidDocument>,
}

impl DidManager {
    /// Create a new, empty DID manager.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Mint `did:vouch:<method>:<bs58 pubkey>` and store its document.
    pub fn create_did(&self, method: &str, keypair: &KeyPair) -> Result<Did, IdentityError> {
        let pubkey_bs58 = keypair.public_key().to_bs58();
        let did = Did::from_parts(VOUCH_METHOD, &format!("{}:{}", method, pubkey_bs58))?;
        self.register(did.as_str(), keypair)?;
        Ok(did)
    }

    /// Register a document for an externally named DID (e.g. `did:web:`).
    pub fn register(&self, did: &str, keypair: &KeyPair) -> Result<DidDocument, IdentityError> {
        validate_did(did)?;
        if self.store.contains_key(did) {
            return Err(IdentityError::DuplicateDid(did.to_string()));
        }

        let doc = DidDocument::new(did, &keypair.public_key());
        self.store.insert(did.to_string(), doc.clone());

        tracing::info!(did = %did, "DID registered");
        Ok(doc)
    }

    /// Resolve a DID to its document.
    ///
    /// Returns `None` if the DID is not in the local store.
    pub fn resolve_did(&self, did: &str) -> Option<DidDocument> {
        self.store.get(did).map(|entry| entry.clone())
    }

    /// Replace a stored DID document.
    pub fn update_document(&self, doc: DidDocument) -> Result<(), IdentityError> {
        if !self.store.contains_key(&doc.id) {
            return Err(IdentityError::DidNotFound(doc.id.clone()));
        }
        self.store.insert(doc.id.clone(), doc);
        Ok(())
    }

    pub fn remove_did(&self, did: &str) -> Option<DidDocument> {
        self.store.remove(did).map(|(_, doc)| doc)
    }

    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// List all stored DID URIs.
    pub fn list_dids(&self) -> Vec<String> {
        self.store.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for DidManager {
    fn default() -> Self {
        Self::new()
    }
}

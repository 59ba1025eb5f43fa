use std::sync::Arc;

use async_trait::async_trait;
use vouch_core::validate_did;

use crate::did::{public_key_from_key_did, DidManager};
use crate::document::DidDocument;
use crate::error::IdentityError;

/// Trait for resolving DIDs to their documents.
///
/// Implementations reject malformed DID syntax with
/// [`IdentityError::MalformedIdentifier`] before any lookup.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve a DID URI to its DID Document.
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError>;
}

/// Resolves DIDs from the local in-memory DidManager.
pub struct LocalDidResolver {
    manager: Arc<DidManager>,
}

impl LocalDidResolver {
    /// Create a new local resolver backed by a DidManager.
    pub fn new(manager: Arc<DidManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl DidResolver for LocalDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        validate_did(did)?;
        self.manager
            .resolve_did(did)
            .ok_or_else(|| IdentityError::DidNotFound(did.to_string()))
    }
}

/// Derives documents for `did:vouch:key:` identifiers from the key itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyDidResolver;

#[async_trait]
impl DidResolver for KeyDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        let public_key = public_key_from_key_did(did)?;
        Ok(DidDocument::new(did, &public_key))
    }
}

/// Composite resolver that tries multiple resolvers in order.
///
/// Returns the first successful resolution, or the last error.
pub struct CompositeDidResolver {
    resolvers: Vec<Box<dyn DidResolver>>,
}

impl CompositeDidResolver {
    /// Create a new composite resolver with no backends.
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Add a resolver to the chain.
    pub fn add_resolver(&mut self, resolver: Box<dyn DidResolver>) {
        self.resolvers.push(resolver);
    }

    /// Builder form of [`add_resolver`](Self::add_resolver).
    pub fn with(mut self, resolver: impl DidResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Number of registered resolvers.
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

impl Default for CompositeDidResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DidResolver for CompositeDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        validate_did(did)?;
        let mut last_error = IdentityError::DidResolution("no resolvers configured".into());

        for resolver in &self.resolvers {
            match resolver.resolve(did).await {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    tracing::debug!(did = did, error = %e, "resolver failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

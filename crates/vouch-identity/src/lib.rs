//! Vouch Identity Layer
//!
//! Decentralised identity and proof primitives:
//! - DID creation and DID Documents (W3C-compatible)
//! - DID resolution (local, key-derived, composite)
//! - Verifiable Credential and Presentation data model
//! - Data-integrity proofs (Ed25519, canonical JSON) and compact JWS

pub mod credentials;
pub mod did;
pub mod did_resolver;
pub mod document;
pub mod error;
pub mod jws;
pub mod presentation;
pub mod proof;

pub use credentials::{
    Credential, CredentialSchema, CredentialStatus, CredentialSubject, Issuer,
    PRESENTATION_FORMAT_CLAIM,
};
pub use did::{key_did, DidManager};
pub use did_resolver::{CompositeDidResolver, DidResolver, KeyDidResolver, LocalDidResolver};
pub use document::{DidDocument, VerificationMethod};
pub use error::IdentityError;
pub use jws::CompactJws;
pub use presentation::Presentation;
pub use proof::{
    sign, timestamp_now, Proof, ProofEngine, ProofOptions, ProofPurpose, Signer,
    VerificationOutcome, INVALID_SIGNATURE_SENTINEL,
};

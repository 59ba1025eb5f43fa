//! Vouch Credentials: issuance, revocation, selective disclosure,
//! presentations, verification and the authorization handshake.

pub mod authorization;
pub mod error;
pub mod issuer;
pub mod presentation;
pub mod revocation;
pub mod schema;
pub mod sd_jwt;
pub mod store;
pub mod verifier;

pub use authorization::{
    AuthorizationProtocol, AuthorizationRequest, AuthorizationResponse, AuthorizationState,
};
pub use error::CredentialError;
pub use issuer::{CredentialIssuer, ErrorInjection, IssueOptions};
pub use presentation::{filter_subject, PresentationBuilder};
pub use revocation::{RegistrySnapshot, RevocationRegistry, StatusListCredential};
pub use schema::{ClaimDefinition, ClaimType, SchemaDefinition, SchemaRegistry, PERSONAL_INFO_V1};
pub use sd_jwt::DisclosureBundle;
pub use store::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};
pub use verifier::{
    detect_format, DetailedReport, Format, VerificationChecks, VerificationPipeline,
    VerificationResult,
};

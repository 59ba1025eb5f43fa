//! Challenge/response handshake that binds an issuance request to a holder.
//!
//! The issuer publishes an [`AuthorizationRequest`] carrying a fresh
//! challenge. The holder answers with an [`AuthorizationResponse`] signed for
//! `authentication` over that challenge and domain. How the two messages
//! travel is up to the caller; no correlation state is kept here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vouch_core::{validate_did, EngineConfig};
use vouch_crypto::{random_challenge, KeyPair};
use vouch_identity::proof::{sign, timestamp_now, ProofEngine, ProofOptions, ProofPurpose, Signer};
use vouch_identity::{Issuer, Proof, VerificationOutcome};

use crate::error::CredentialError;

pub const AUTHORIZATION_REQUEST: &str = "AuthorizationRequest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub credential_type: Vec<String>,
    pub issuer: Issuer,
    pub purpose: String,
    pub challenge: String,
    pub domain: String,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResponse {
    pub request_id: String,
    pub holder: String,
    pub accepted: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationState {
    Requested,
    Accepted,
    Declined,
}

impl AuthorizationState {
    pub fn of(response: Option<&AuthorizationResponse>) -> Self {
        match response {
            None => Self::Requested,
            Some(r) if r.accepted => Self::Accepted,
            Some(_) => Self::Declined,
        }
    }
}

pub struct AuthorizationProtocol {
    issuer: Issuer,
    domain: String,
    callback_url: Option<String>,
    engine: ProofEngine,
}

impl AuthorizationProtocol {
    pub fn new(issuer: Issuer, domain: impl Into<String>, engine: ProofEngine) -> Self {
        Self {
            issuer,
            domain: domain.into(),
            callback_url: None,
            engine,
        }
    }

    pub fn from_config(config: &EngineConfig, engine: ProofEngine) -> Self {
        let issuer = Issuer {
            id: config.issuer.did.clone(),
            name: config.issuer.name.clone(),
            image: config.issuer.image.clone(),
        };
        let callback_url =
            Some(config.authorization.callback_url.clone()).filter(|url| !url.is_empty());
        Self::new(issuer, config.authorization.domain.clone(), engine)
            .with_callback_url(callback_url)
    }

    pub fn with_callback_url(mut self, url: Option<String>) -> Self {
        self.callback_url = url;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// New request with a fresh 32-byte challenge and request id.
    pub fn generate_request(
        &self,
        credential_types: Vec<String>,
        purpose: impl Into<String>,
    ) -> AuthorizationRequest {
        let request = AuthorizationRequest {
            request_type: AUTHORIZATION_REQUEST.to_string(),
            credential_type: credential_types,
            issuer: Issuer {
                id: self.issuer.id.clone(),
                name: self.issuer.name.clone(),
                image: None,
            },
            purpose: purpose.into(),
            challenge: random_challenge(),
            domain: self.domain.clone(),
            request_id: Uuid::new_v4().to_string(),
            timestamp: timestamp_now(),
            callback_url: self.callback_url.clone(),
        };
        tracing::info!(
            request_id = %request.request_id,
            issuer = %request.issuer.id,
            "authorization request created"
        );
        request
    }

    /// Holder side: answer `request`, signing for `authentication` over its
    /// challenge and domain. A malformed holder DID is rejected before
    /// anything is signed.
    pub fn generate_response(
        request: &AuthorizationRequest,
        holder_did: &str,
        accepted: bool,
        keypair: &KeyPair,
    ) -> Result<AuthorizationResponse, CredentialError> {
        validate_did(holder_did)?;

        let mut response = AuthorizationResponse {
            request_id: request.request_id.clone(),
            holder: holder_did.to_string(),
            accepted,
            timestamp: timestamp_now(),
            proof: None,
        };
        let options = ProofOptions::default().with_challenge(&request.challenge, &request.domain);
        let proof = sign(
            &response,
            &Signer::new(holder_did, keypair),
            ProofPurpose::Authentication,
            &options,
        )
        .map_err(|e| CredentialError::SigningFailure(e.to_string()))?;
        response.proof = Some(proof);

        tracing::debug!(
            request_id = %response.request_id,
            holder = holder_did,
            accepted,
            "authorization response signed"
        );
        Ok(response)
    }

    /// Check a response against the request it claims to answer.
    ///
    /// Replay violations (request id, challenge or domain mismatch) are
    /// errors. Signature and holder-binding problems are reported in the
    /// outcome.
    pub async fn verify_response(
        &self,
        request: &AuthorizationRequest,
        response: &AuthorizationResponse,
    ) -> Result<VerificationOutcome, CredentialError> {
        if response.request_id != request.request_id {
            return Err(CredentialError::ReplayMismatch(format!(
                "response answers {} not {}",
                response.request_id, request.request_id
            )));
        }
        let proof = response.proof.as_ref().ok_or_else(|| {
            CredentialError::MalformedPresentation("authorization response has no proof".into())
        })?;
        if proof.challenge.as_deref() != Some(request.challenge.as_str()) {
            return Err(CredentialError::ReplayMismatch("challenge does not match request".into()));
        }
        if proof.domain.as_deref() != Some(request.domain.as_str()) {
            return Err(CredentialError::ReplayMismatch("domain does not match request".into()));
        }

        let mut outcome = self
            .engine
            .verify_for_purpose(response, proof, ProofPurpose::Authentication)
            .await;
        if proof.signer_did() != response.holder {
            outcome.valid = false;
            outcome.detail.push(format!(
                "proof key {} does not belong to holder {}",
                proof.verification_method, response.holder
            ));
        }

        tracing::info!(
            request_id = %request.request_id,
            holder = %response.holder,
            valid = outcome.valid,
            state = ?AuthorizationState::of(Some(response)),
            "authorization response verified"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vouch_crypto::b64url_decode;
    use vouch_identity::{key_did, KeyDidResolver};

    fn protocol() -> AuthorizationProtocol {
        let config = EngineConfig::default();
        AuthorizationProtocol::from_config(&config, ProofEngine::new(Arc::new(KeyDidResolver)))
    }

    fn holder() -> (KeyPair, String) {
        let kp = KeyPair::generate();
        let did = key_did(&kp.public_key());
        (kp, did)
    }

    #[test]
    fn test_generate_request() {
        let p = protocol();
        let a = p.generate_request(vec!["PersonalInfoCredential".into()], "onboarding");
        let b = p.generate_request(vec!["PersonalInfoCredential".into()], "onboarding");

        assert_eq!(a.request_type, AUTHORIZATION_REQUEST);
        assert_eq!(b64url_decode(&a.challenge).unwrap().len(), 32);
        assert_ne!(a.challenge, b.challenge);
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.domain, p.domain());
        assert_eq!(AuthorizationState::of(None), AuthorizationState::Requested);
    }

    #[tokio::test]
    async fn test_response_roundtrip() {
        let p = protocol();
        let (kp, did) = holder();
        let request = p.generate_request(vec!["PersonalInfoCredential".into()], "onboarding");
        let response = AuthorizationProtocol::generate_response(&request, &did, true, &kp).unwrap();

        let proof = response.proof.as_ref().unwrap();
        assert_eq!(proof.proof_purpose, "authentication");
        assert_eq!(proof.challenge.as_deref(), Some(request.challenge.as_str()));

        let outcome = p.verify_response(&request, &response).await.unwrap();
        assert!(outcome.valid, "{:?}", outcome.detail);
        assert_eq!(AuthorizationState::of(Some(&response)), AuthorizationState::Accepted);
    }

    #[tokio::test]
    async fn test_declined_response_still_signed() {
        let p = protocol();
        let (kp, did) = holder();
        let request = p.generate_request(vec![], "onboarding");
        let response =
            AuthorizationProtocol::generate_response(&request, &did, false, &kp).unwrap();
        assert!(p.verify_response(&request, &response).await.unwrap().valid);
        assert_eq!(AuthorizationState::of(Some(&response)), AuthorizationState::Declined);
    }

    #[test]
    fn test_malformed_holder_rejected() {
        let p = protocol();
        let (kp, _) = holder();
        let request = p.generate_request(vec![], "onboarding");
        assert!(matches!(
            AuthorizationProtocol::generate_response(&request, "not-a-did", true, &kp),
            Err(CredentialError::MalformedIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_replayed_response_rejected() {
        let p = protocol();
        let (kp, did) = holder();
        let first = p.generate_request(vec![], "onboarding");
        let second = p.generate_request(vec![], "onboarding");
        let response = AuthorizationProtocol::generate_response(&first, &did, true, &kp).unwrap();

        assert!(matches!(
            p.verify_response(&second, &response).await,
            Err(CredentialError::ReplayMismatch(_))
        ));

        let mut same_id = second.clone();
        same_id.request_id = first.request_id.clone();
        assert!(matches!(
            p.verify_response(&same_id, &response).await,
            Err(CredentialError::ReplayMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_foreign_signer_invalid() {
        let p = protocol();
        let (_, did) = holder();
        let impostor = KeyPair::generate();
        let request = p.generate_request(vec![], "onboarding");
        let response =
            AuthorizationProtocol::generate_response(&request, &did, true, &impostor).unwrap();

        let outcome = p.verify_response(&request, &response).await.unwrap();
        assert!(!outcome.valid);
        assert!(!outcome.signature_valid);
    }

    #[tokio::test]
    async fn test_tampered_accepted_flag() {
        let p = protocol();
        let (kp, did) = holder();
        let request = p.generate_request(vec![], "onboarding");
        let mut response =
            AuthorizationProtocol::generate_response(&request, &did, false, &kp).unwrap();
        response.accepted = true;
        assert!(!p.verify_response(&request, &response).await.unwrap().valid);
    }
}

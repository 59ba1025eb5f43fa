//! Detached data-integrity proofs.
//!
//! A proof signs the canonical JSON of `{"document": <document without
//! proof>, "proof": <proof options without proofValue>}` with Ed25519, so the
//! proof's `created`, purpose, challenge and domain are covered alongside the
//! document itself.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vouch_core::split_did_url;
use vouch_crypto::{canonical_bytes, KeyPair, PublicKey, Signature};

use crate::did_resolver::DidResolver;
use crate::document::{DidDocument, PRIMARY_KEY_FRAGMENT};
use crate::error::IdentityError;

pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";
pub const EDDSA_JCS_2022: &str = "eddsa-jcs-2022";

/// Proof value that always verifies as a bad signature over an otherwise
/// well-formed proof. Only emitted when explicitly requested.
pub const INVALID_SIGNATURE_SENTINEL: &str = "invalid_signature_for_testing_purposes";

/// Default bound on verification-method resolution.
pub const DEFAULT_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Current time at millisecond precision, the granularity documents carry.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Why a proof was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    AssertionMethod,
    Authentication,
    KeyAgreement,
}

impl ProofPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssertionMethod => "assertionMethod",
            Self::Authentication => "authentication",
            Self::KeyAgreement => "keyAgreement",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assertionMethod" => Some(Self::AssertionMethod),
            "authentication" => Some(Self::Authentication),
            "keyAgreement" => Some(Self::KeyAgreement),
            _ => None,
        }
    }
}

impl fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detached signature record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: DateTime<Utc>,
    /// DID URL of the signing key (`did#fragment`).
    pub verification_method: String,
    pub proof_purpose: String,
    pub cryptosuite: String,
    pub proof_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Proof {
    /// The DID part of the verification method.
    pub fn signer_did(&self) -> &str {
        split_did_url(&self.verification_method).0
    }

    pub fn is_sentinel(&self) -> bool {
        self.proof_value == INVALID_SIGNATURE_SENTINEL
    }
}

/// A key able to produce proofs, bound to its verification method.
pub struct Signer<'a> {
    verification_method: String,
    keypair: &'a KeyPair,
}

impl<'a> Signer<'a> {
    /// Signer using the DID's primary key (`did#key-1`).
    pub fn new(did: &str, keypair: &'a KeyPair) -> Self {
        Self {
            verification_method: format!("{}#{}", did, PRIMARY_KEY_FRAGMENT),
            keypair,
        }
    }

    pub fn with_verification_method(
        verification_method: impl Into<String>,
        keypair: &'a KeyPair,
    ) -> Self {
        Self {
            verification_method: verification_method.into(),
            keypair,
        }
    }

    pub fn verification_method(&self) -> &str {
        &self.verification_method
    }

    pub fn did(&self) -> &str {
        split_did_url(&self.verification_method).0
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Raw Ed25519 signature over `message`.
    pub fn sign_bytes(&self, message: &[u8]) -> Signature {
        vouch_crypto::sign(message, self.keypair)
    }
}

/// Optional proof parameters.
#[derive(Debug, Clone, Default)]
pub struct ProofOptions {
    pub created: Option<DateTime<Utc>>,
    pub challenge: Option<String>,
    pub domain: Option<String>,
    /// Emit [`INVALID_SIGNATURE_SENTINEL`] instead of a real signature.
    pub invalid_signature: bool,
}

impl ProofOptions {
    pub fn with_challenge(
        mut self,
        challenge: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        self.challenge = Some(challenge.into());
        self.domain = Some(domain.into());
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_invalid_signature(mut self, invalid: bool) -> Self {
        self.invalid_signature = invalid;
        self
    }
}

/// Create a proof over `document`. The document is not modified; any
/// top-level `proof` member it already carries is excluded from the signed
/// bytes.
pub fn sign<T: Serialize + ?Sized>(
    document: &T,
    signer: &Signer<'_>,
    purpose: ProofPurpose,
    options: &ProofOptions,
) -> Result<Proof, IdentityError> {
    let unsecured = unsecured_document(document)?;

    let mut proof = Proof {
        proof_type: DATA_INTEGRITY_PROOF.to_string(),
        created: options.created.unwrap_or_else(timestamp_now),
        verification_method: signer.verification_method.clone(),
        proof_purpose: purpose.as_str().to_string(),
        cryptosuite: EDDSA_JCS_2022.to_string(),
        proof_value: String::new(),
        challenge: options.challenge.clone(),
        domain: options.domain.clone(),
    };

    if options.invalid_signature {
        tracing::debug!(
            verification_method = %proof.verification_method,
            "emitting sentinel proof value"
        );
        proof.proof_value = INVALID_SIGNATURE_SENTINEL.to_string();
        return Ok(proof);
    }

    let message = signing_input(&unsecured, &proof)?;
    proof.proof_value = signer.sign_bytes(&message).to_multibase();
    Ok(proof)
}

/// Bytes covered by a proof.
pub fn signing_input(unsecured: &Value, proof: &Proof) -> Result<Vec<u8>, IdentityError> {
    let mut options = serde_json::to_value(proof)?;
    if let Value::Object(map) = &mut options {
        map.remove("proofValue");
    }
    let combined = serde_json::json!({
        "document": unsecured,
        "proof": options,
    });
    Ok(canonical_bytes(&combined)?)
}

fn unsecured_document<T: Serialize + ?Sized>(document: &T) -> Result<Value, IdentityError> {
    let mut value = serde_json::to_value(document)?;
    if let Value::Object(map) = &mut value {
        map.remove("proof");
    }
    Ok(value)
}

/// Result of verifying one proof. Every flag is evaluated independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub valid: bool,
    pub signature_valid: bool,
    pub method_resolved: bool,
    pub purpose_valid: bool,
    pub cryptosuite_supported: bool,
    pub detail: Vec<String>,
}

impl VerificationOutcome {
    fn finish(mut self) -> Self {
        self.valid = self.signature_valid
            && self.method_resolved
            && self.purpose_valid
            && self.cryptosuite_supported;
        self
    }
}

/// Verifies proofs against keys found through a [`DidResolver`].
#[derive(Clone)]
pub struct ProofEngine {
    resolver: Arc<dyn DidResolver>,
    timeout: Duration,
    supported_cryptosuites: Vec<String>,
}

impl ProofEngine {
    pub fn new(resolver: Arc<dyn DidResolver>) -> Self {
        Self {
            resolver,
            timeout: DEFAULT_RESOLUTION_TIMEOUT,
            supported_cryptosuites: vec![EDDSA_JCS_2022.to_string()],
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cryptosuites(mut self, suites: Vec<String>) -> Self {
        self.supported_cryptosuites = suites;
        self
    }

    pub fn resolver(&self) -> &Arc<dyn DidResolver> {
        &self.resolver
    }

    /// Resolve a DID, bounded by the engine timeout.
    pub async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        match tokio::time::timeout(self.timeout, self.resolver.resolve(did)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    did = did,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "DID resolution timed out"
                );
                Err(IdentityError::ResolutionTimeout(did.to_string()))
            }
        }
    }

    /// Resolve a DID URL to its document and the verification method's key.
    pub async fn resolve_key(
        &self,
        verification_method: &str,
    ) -> Result<(DidDocument, PublicKey), IdentityError> {
        let (did, _) = split_did_url(verification_method);
        let doc = self.resolve(did).await?;
        let vm = doc
            .verification_method(verification_method)
            .ok_or_else(|| {
                IdentityError::VerificationMethodNotFound(verification_method.to_string())
            })?;
        let key = vm.public_key()?;
        Ok((doc, key))
    }

    /// Verify a proof over `document`. Never fails; problems are reported in
    /// the outcome.
    pub async fn verify<T: Serialize + ?Sized>(
        &self,
        document: &T,
        proof: &Proof,
    ) -> VerificationOutcome {
        let mut outcome = VerificationOutcome {
            valid: false,
            signature_valid: false,
            method_resolved: false,
            purpose_valid: false,
            cryptosuite_supported: false,
            detail: Vec::new(),
        };

        if proof.is_sentinel() {
            outcome.method_resolved = true;
            outcome.purpose_valid = true;
            outcome.cryptosuite_supported = true;
            outcome.detail.push("signature verification failed".into());
            return outcome.finish();
        }

        outcome.cryptosuite_supported = proof.proof_type == DATA_INTEGRITY_PROOF
            && self.supported_cryptosuites.iter().any(|s| *s == proof.cryptosuite);
        if !outcome.cryptosuite_supported {
            outcome.detail.push(format!(
                "unsupported cryptosuite: {} / {}",
                proof.proof_type, proof.cryptosuite
            ));
        }

        let purpose_known = ProofPurpose::parse(&proof.proof_purpose).is_some();
        if !purpose_known {
            outcome.detail.push(format!("unknown proof purpose: {}", proof.proof_purpose));
        }

        let resolved = match self.resolve_key(&proof.verification_method).await {
            Ok(resolved) => {
                outcome.method_resolved = true;
                Some(resolved)
            }
            Err(e) => {
                outcome.detail.push(format!("verification method not resolved: {}", e));
                None
            }
        };

        outcome.purpose_valid = match &resolved {
            Some((doc, _)) => {
                let authorised =
                    doc.is_authorized(&proof.verification_method, &proof.proof_purpose);
                if purpose_known && !authorised {
                    outcome.detail.push(format!(
                        "{} is not authorised for {}",
                        proof.verification_method, proof.proof_purpose
                    ));
                }
                purpose_known && authorised
            }
            None => purpose_known,
        };

        if let Some((_, key)) = &resolved {
            match check_signature(document, proof, key) {
                Ok(()) => outcome.signature_valid = true,
                Err(e) => outcome.detail.push(format!("signature verification failed: {}", e)),
            }
        }

        outcome.finish()
    }

    /// [`verify`](Self::verify), additionally requiring a specific purpose.
    pub async fn verify_for_purpose<T: Serialize + ?Sized>(
        &self,
        document: &T,
        proof: &Proof,
        expected: ProofPurpose,
    ) -> VerificationOutcome {
        let mut outcome = self.verify(document, proof).await;
        if proof.proof_purpose != expected.as_str() {
            outcome.purpose_valid = false;
            outcome.detail.push(format!(
                "proof purpose {} does not match expected {}",
                proof.proof_purpose, expected
            ));
        }
        outcome.finish()
    }
}

/// Check a proof's signature against a known key.
pub fn check_signature<T: Serialize + ?Sized>(
    document: &T,
    proof: &Proof,
    key: &PublicKey,
) -> Result<(), IdentityError> {
    let unsecured = unsecured_document(document)?;
    let message = signing_input(&unsecured, proof)?;
    let signature = Signature::from_multibase(&proof.proof_value)?;
    vouch_crypto::verify(&message, &signature, key)?;
    Ok(())
}

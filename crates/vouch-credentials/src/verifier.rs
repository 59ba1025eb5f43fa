//! Verification pipeline.
//!
//! Every input runs the same five checks: schema, validity window,
//! revocation, issuer and proof. The checks are independent. A failure never
//! aborts the run, so the report always explains every problem found.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use vouch_core::StatusState;
use vouch_identity::proof::{ProofEngine, ProofPurpose};
use vouch_identity::{Credential, DidDocument, IdentityError, Presentation, Proof};

use crate::revocation::RevocationRegistry;
use crate::schema::SchemaRegistry;
use crate::sd_jwt;

const SIGNATURE_PREVIEW_CHARS: usize = 16;

/// The three presentation shapes a verifier accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    Vc,
    SdJwt,
    Vp,
}

/// Classify a document by structure: a `verifiableCredential` array makes it
/// a presentation, a proof value (or bare string) containing the disclosure
/// separator makes it SD form, anything else is a plain credential.
pub fn detect_format(input: &Value) -> Format {
    if input.get("verifiableCredential").is_some_and(Value::is_array) {
        return Format::Vp;
    }
    let sd = match input {
        Value::String(s) => sd_jwt::is_sd_presentation(s),
        _ => input
            .pointer("/proof/proofValue")
            .and_then(Value::as_str)
            .is_some_and(sd_jwt::is_sd_presentation),
    };
    if sd {
        Format::SdJwt
    } else {
        Format::Vc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationChecks {
    pub schema_valid: bool,
    pub not_expired: bool,
    pub not_revoked: bool,
    pub proof_valid: bool,
    pub issuer_valid: bool,
}

impl VerificationChecks {
    fn failed() -> Self {
        Self {
            schema_valid: false,
            not_expired: false,
            not_revoked: false,
            proof_valid: false,
            issuer_valid: false,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.schema_valid
            && self.not_expired
            && self.not_revoked
            && self.proof_valid
            && self.issuer_valid
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    pub format: Format,
    pub checks: VerificationChecks,
    pub errors: Vec<String>,
}

impl VerificationResult {
    fn new(format: Format, checks: VerificationChecks, errors: Vec<String>) -> Self {
        Self {
            is_valid: checks.all_passed(),
            format,
            checks,
            errors,
        }
    }

    /// Report for input that could not be read as the detected format.
    fn unreadable(format: Format, reason: &str) -> Self {
        let errors = ["schema", "notExpired", "notRevoked", "proof", "issuer"]
            .iter()
            .map(|check| format!("{}: not evaluated, {}", check, reason))
            .collect();
        Self::new(format, VerificationChecks::failed(), errors)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofDetail {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub cryptosuite: String,
    pub verification_method: String,
    pub proof_purpose: String,
    pub created: DateTime<Utc>,
    pub signature_preview: String,
}

impl From<&Proof> for ProofDetail {
    fn from(proof: &Proof) -> Self {
        let mut preview: String = proof.proof_value.chars().take(SIGNATURE_PREVIEW_CHARS).collect();
        if proof.proof_value.chars().count() > SIGNATURE_PREVIEW_CHARS {
            preview.push_str("...");
        }
        Self {
            proof_type: proof.proof_type.clone(),
            cryptosuite: proof.cryptosuite.clone(),
            verification_method: proof.verification_method.clone(),
            proof_purpose: proof.proof_purpose.clone(),
            created: proof.created,
            signature_preview: preview,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityWindow {
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationDetail {
    pub status_list_credential: String,
    pub status_list_index: String,
    pub state: StatusState,
}

/// Audit detail for one credential. Fields that could not be populated are
/// left empty.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDetail {
    pub id: String,
    pub issuer: String,
    pub checks: VerificationChecks,
    pub issuer_document: Option<DidDocument>,
    pub validity: ValidityWindow,
    pub revocation: Option<RevocationDetail>,
    pub proof: Option<ProofDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
    #[serde(flatten)]
    pub result: VerificationResult,
    pub credentials: Vec<CredentialDetail>,
    pub presentation_proof: Option<ProofDetail>,
}

struct CredentialReport {
    checks: VerificationChecks,
    schema_errors: Vec<String>,
    errors: Vec<String>,
    detail: CredentialDetail,
}

enum Parsed {
    Credential(Format, Credential, Value),
    Presentation(Presentation, Value),
}

/// Runs every check against credentials, SD presentations and VPs.
pub struct VerificationPipeline {
    engine: ProofEngine,
    registry: Arc<RevocationRegistry>,
    schemas: Arc<SchemaRegistry>,
}

impl VerificationPipeline {
    pub fn new(
        engine: ProofEngine,
        registry: Arc<RevocationRegistry>,
        schemas: Arc<SchemaRegistry>,
    ) -> Self {
        Self {
            engine,
            registry,
            schemas,
        }
    }

    pub fn engine(&self) -> &ProofEngine {
        &self.engine
    }

    /// Verify any supported document.
    pub async fn verify_json(&self, input: &Value) -> VerificationResult {
        self.verify_detailed(input).await.result
    }

    /// Verify text holding either a JSON document or a bare SD presentation.
    pub async fn verify_str(&self, input: &str) -> VerificationResult {
        let trimmed = input.trim();
        if trimmed.starts_with('{') {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => self.verify_json(&value).await,
                Err(e) => {
                    VerificationResult::unreadable(Format::Vc, &format!("invalid JSON: {}", e))
                }
            }
        } else {
            self.verify_json(&Value::String(trimmed.to_string())).await
        }
    }

    pub async fn verify(&self, credential: &Credential) -> VerificationResult {
        let format = match &credential.proof {
            Some(p) if sd_jwt::is_sd_presentation(&p.proof_value) => Format::SdJwt,
            _ => Format::Vc,
        };
        match serde_json::to_value(credential) {
            Ok(raw) => self.evaluate_credential(format, credential, &raw).await.result,
            Err(e) => VerificationResult::unreadable(format, &e.to_string()),
        }
    }

    pub async fn verify_sd(&self, presentation: &str) -> VerificationResult {
        self.verify_json(&Value::String(presentation.to_string())).await
    }

    pub async fn verify_presentation(&self, presentation: &Presentation) -> VerificationResult {
        match serde_json::to_value(presentation) {
            Ok(raw) => self.evaluate_presentation(presentation, &raw).await.result,
            Err(e) => VerificationResult::unreadable(Format::Vp, &e.to_string()),
        }
    }

    /// Verify and collect audit detail.
    pub async fn verify_detailed(&self, input: &Value) -> DetailedReport {
        let report = match parse(input) {
            Ok(Parsed::Credential(format, vc, raw)) => {
                self.evaluate_credential(format, &vc, &raw).await
            }
            Ok(Parsed::Presentation(vp, raw)) => self.evaluate_presentation(&vp, &raw).await,
            Err((format, reason)) => DetailedReport {
                result: VerificationResult::unreadable(format, &reason),
                credentials: Vec::new(),
                presentation_proof: None,
            },
        };

        tracing::info!(
            format = ?report.result.format,
            valid = report.result.is_valid,
            errors = report.result.errors.len(),
            "verification complete"
        );
        report
    }

    async fn evaluate_credential(
        &self,
        format: Format,
        vc: &Credential,
        raw: &Value,
    ) -> DetailedReport {
        let report = self.check_credential(vc, raw, Utc::now()).await;
        let mut errors = report.schema_errors;
        errors.extend(report.errors);
        DetailedReport {
            result: VerificationResult::new(format, report.checks, errors),
            credentials: vec![report.detail],
            presentation_proof: None,
        }
    }

    async fn evaluate_presentation(&self, vp: &Presentation, raw: &Value) -> DetailedReport {
        let now = Utc::now();
        let mut errors: Vec<String> = self
            .schemas
            .presentation_violations(vp)
            .into_iter()
            .map(|v| format!("schema: {}", v))
            .collect();
        let mut checks = VerificationChecks {
            schema_valid: errors.is_empty(),
            not_expired: true,
            not_revoked: true,
            proof_valid: self.check_presentation_proof(vp, raw, &mut errors).await,
            issuer_valid: true,
        };

        let mut credentials = Vec::with_capacity(vp.verifiable_credential.len());
        for (i, vc) in vp.verifiable_credential.iter().enumerate() {
            let embedded_raw = match raw.pointer(&format!("/verifiableCredential/{}", i)) {
                Some(v) => v.clone(),
                None => serde_json::to_value(vc).unwrap_or(Value::Null),
            };
            let report = self.check_credential(vc, &embedded_raw, now).await;
            checks.not_expired &= report.checks.not_expired;
            checks.not_revoked &= report.checks.not_revoked;
            checks.issuer_valid &= report.checks.issuer_valid;
            checks.proof_valid &= report.checks.proof_valid;
            errors.extend(
                report
                    .errors
                    .into_iter()
                    .map(|e| format!("verifiableCredential[{}]: {}", i, e)),
            );
            credentials.push(report.detail);
        }

        DetailedReport {
            result: VerificationResult::new(Format::Vp, checks, errors),
            credentials,
            presentation_proof: vp.proof.as_ref().map(ProofDetail::from),
        }
    }

    async fn check_credential(
        &self,
        vc: &Credential,
        raw: &Value,
        now: DateTime<Utc>,
    ) -> CredentialReport {
        let schema_errors: Vec<String> = self
            .schemas
            .credential_violations(vc)
            .into_iter()
            .map(|v| format!("schema: {}", v))
            .collect();
        let mut errors = Vec::new();

        let not_expired = vc.is_valid_at(now);
        if !not_expired {
            if now < vc.valid_from {
                errors.push(format!("credential is not yet valid (validFrom {})", vc.valid_from));
            } else if let Some(until) = vc.valid_until {
                errors.push(format!("credential has expired (validUntil {})", until));
            }
        }

        let not_revoked = !self.registry.is_revoked(&vc.id);
        if !not_revoked {
            errors.push("credential has been revoked".to_string());
        }

        let (issuer_valid, issuer_document) = self.check_issuer(vc, &mut errors).await;
        let proof_valid = self.check_credential_proof(vc, raw, &mut errors).await;

        let checks = VerificationChecks {
            schema_valid: schema_errors.is_empty(),
            not_expired,
            not_revoked,
            proof_valid,
            issuer_valid,
        };
        tracing::debug!(credential_id = %vc.id, ?checks, "credential checks evaluated");

        let detail = CredentialDetail {
            id: vc.id.clone(),
            issuer: vc.issuer.id.clone(),
            checks,
            issuer_document,
            validity: ValidityWindow {
                valid_from: vc.valid_from,
                valid_until: vc.valid_until,
                checked_at: now,
            },
            revocation: vc.credential_status.as_ref().map(|status| RevocationDetail {
                status_list_credential: status.status_list_credential.clone(),
                status_list_index: status.status_list_index.clone(),
                state: self.registry.state(&vc.id),
            }),
            proof: vc.proof.as_ref().map(ProofDetail::from),
        };

        CredentialReport {
            checks,
            schema_errors,
            errors,
            detail,
        }
    }

    /// Issuer DID resolves, names itself, and controls the proof key.
    async fn check_issuer(
        &self,
        vc: &Credential,
        errors: &mut Vec<String>,
    ) -> (bool, Option<DidDocument>) {
        let doc = match self.engine.resolve(&vc.issuer.id).await {
            Ok(doc) => doc,
            Err(IdentityError::ResolutionTimeout(did)) => {
                errors.push(format!("issuer: resolution timed out for {}", did));
                return (false, None);
            }
            Err(e) => {
                errors.push(format!("issuer: {}", e));
                return (false, None);
            }
        };

        let mut valid = true;
        if doc.id != vc.issuer.id {
            valid = false;
            errors.push(format!(
                "issuer: resolved document {} does not match {}",
                doc.id, vc.issuer.id
            ));
        }
        if let Some(proof) = &vc.proof {
            if proof.signer_did() != vc.issuer.id {
                valid = false;
                errors.push(format!(
                    "issuer: proof key {} does not belong to {}",
                    proof.verification_method, vc.issuer.id
                ));
            }
        }
        (valid, Some(doc))
    }

    async fn check_credential_proof(
        &self,
        vc: &Credential,
        raw: &Value,
        errors: &mut Vec<String>,
    ) -> bool {
        let Some(proof) = &vc.proof else {
            errors.push("proof: credential has no proof".to_string());
            return false;
        };

        if sd_jwt::is_sd_presentation(&proof.proof_value) {
            return self.check_sd_proof(vc, proof, errors).await;
        }

        if vc.selectively_disclosed {
            errors.push(
                "proof: credential was selectively disclosed by design; the issuer signature \
                 covers the full claim set and cannot match the filtered subject"
                    .to_string(),
            );
            return false;
        }

        let outcome = self
            .engine
            .verify_for_purpose(raw, proof, ProofPurpose::AssertionMethod)
            .await;
        errors.extend(outcome.detail.iter().map(|d| format!("proof: {}", d)));
        outcome.valid
    }

    async fn check_sd_proof(
        &self,
        vc: &Credential,
        proof: &Proof,
        errors: &mut Vec<String>,
    ) -> bool {
        let (decoded, outcome) = match sd_jwt::verify(&proof.proof_value, &self.engine).await {
            Ok(result) => result,
            Err(e) => {
                errors.push(format!("proof: {}", e));
                return false;
            }
        };

        let mut valid = outcome.valid;
        errors.extend(outcome.detail.iter().map(|d| format!("proof: {}", d)));
        if decoded.credential_subject != vc.credential_subject {
            valid = false;
            errors.push(
                "proof: visible subject does not match the verified disclosures".to_string(),
            );
        }
        if decoded.issuer.id != vc.issuer.id {
            valid = false;
            errors.push(format!(
                "proof: envelope issuer {} differs from credential issuer {}",
                decoded.issuer.id, vc.issuer.id
            ));
        }
        let kid = decoded.proof.as_ref().map(|p| p.verification_method.as_str());
        if kid != Some(proof.verification_method.as_str()) {
            valid = false;
            errors.push(
                "proof: envelope key differs from the proof verification method".to_string(),
            );
        }
        valid
    }

    async fn check_presentation_proof(
        &self,
        vp: &Presentation,
        raw: &Value,
        errors: &mut Vec<String>,
    ) -> bool {
        let Some(proof) = &vp.proof else {
            errors.push("proof: presentation has no proof".to_string());
            return false;
        };

        let mut valid = true;
        if proof.signer_did() != vp.holder {
            valid = false;
            errors.push(format!(
                "proof: presentation signed by {} but holder is {}",
                proof.signer_did(),
                vp.holder
            ));
        }
        for (i, vc) in vp.verifiable_credential.iter().enumerate() {
            if vc.credential_subject.id != vp.holder {
                valid = false;
                errors.push(format!(
                    "proof: verifiableCredential[{}] subject {} is not the holder",
                    i, vc.credential_subject.id
                ));
            }
        }

        let outcome = self
            .engine
            .verify_for_purpose(raw, proof, ProofPurpose::AssertionMethod)
            .await;
        errors.extend(outcome.detail.iter().map(|d| format!("proof: presentation {}", d)));
        valid && outcome.valid
    }
}

fn parse(input: &Value) -> Result<Parsed, (Format, String)> {
    let format = detect_format(input);
    match (format, input) {
        (Format::SdJwt, Value::String(s)) => {
            let vc = sd_jwt::decode(s).map_err(|e| (format, e.to_string()))?;
            let raw = serde_json::to_value(&vc).map_err(|e| (format, e.to_string()))?;
            Ok(Parsed::Credential(format, vc, raw))
        }
        (Format::Vp, _) => serde_json::from_value(input.clone())
            .map(|vp| Parsed::Presentation(vp, input.clone()))
            .map_err(|e| (format, format!("not a presentation: {}", e))),
        _ => serde_json::from_value(input.clone())
            .map(|vc| Parsed::Credential(format, vc, input.clone()))
            .map_err(|e| (format, format!("not a credential: {}", e))),
    }
}

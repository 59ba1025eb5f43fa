//! Compact JWS (`header.payload.signature`) with EdDSA.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vouch_crypto::{b64url_decode, b64url_encode, PublicKey, Signature};

use crate::error::IdentityError;
use crate::proof::{
    ProofEngine, ProofPurpose, Signer, VerificationOutcome, INVALID_SIGNATURE_SENTINEL,
};

pub const ALG_EDDSA: &str = "EdDSA";
pub const TYP_SD_JWT: &str = "vc+sd-jwt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    pub typ: String,
    /// Verification method of the signing key.
    pub kid: String,
}

/// Sign `payload` into a compact JWS. With `invalid_signature` the signature
/// segment carries the sentinel value instead of a real signature.
pub fn encode_compact(
    payload: &Value,
    typ: &str,
    signer: &Signer<'_>,
    invalid_signature: bool,
) -> Result<String, IdentityError> {
    let header = JwsHeader {
        alg: ALG_EDDSA.to_string(),
        typ: typ.to_string(),
        kid: signer.verification_method().to_string(),
    };
    let signing_input = format!(
        "{}.{}",
        b64url_encode(serde_json::to_vec(&header)?),
        b64url_encode(serde_json::to_vec(payload)?)
    );
    let signature = if invalid_signature {
        INVALID_SIGNATURE_SENTINEL.to_string()
    } else {
        signer.sign_bytes(signing_input.as_bytes()).to_b64url()
    };
    Ok(format!("{}.{}", signing_input, signature))
}

/// A parsed, not yet verified, compact JWS.
#[derive(Debug, Clone)]
pub struct CompactJws {
    pub header: JwsHeader,
    pub payload: Value,
    signing_input: String,
    signature: String,
}

impl CompactJws {
    pub fn parse(token: &str) -> Result<Self, IdentityError> {
        let mut parts = token.split('.');
        let (header_b64, payload_b64, signature) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => {
                    return Err(IdentityError::MalformedEnvelope(
                        "compact JWS must have three segments".into(),
                    ))
                }
            };

        let header: JwsHeader = serde_json::from_slice(&b64url_decode(header_b64)?)
            .map_err(|e| IdentityError::MalformedEnvelope(format!("header: {}", e)))?;
        let payload: Value = serde_json::from_slice(&b64url_decode(payload_b64)?)
            .map_err(|e| IdentityError::MalformedEnvelope(format!("payload: {}", e)))?;

        Ok(Self {
            header,
            payload,
            signing_input: format!("{}.{}", header_b64, payload_b64),
            signature: signature.to_string(),
        })
    }

    /// Raw signature segment.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn is_sentinel(&self) -> bool {
        self.signature == INVALID_SIGNATURE_SENTINEL
    }

    /// Check the signature against a known key.
    pub fn verify_with(&self, key: &PublicKey) -> Result<(), IdentityError> {
        if self.header.alg != ALG_EDDSA {
            return Err(IdentityError::MalformedEnvelope(format!(
                "unsupported alg {}",
                self.header.alg
            )));
        }
        let signature = Signature::from_b64url(&self.signature)?;
        vouch_crypto::verify(self.signing_input.as_bytes(), &signature, key)?;
        Ok(())
    }
}

impl ProofEngine {
    /// Verify a compact JWS whose `kid` names the signing key.
    pub async fn verify_jws(&self, jws: &CompactJws, purpose: ProofPurpose) -> VerificationOutcome {
        let mut outcome = VerificationOutcome {
            valid: false,
            signature_valid: false,
            method_resolved: false,
            purpose_valid: false,
            cryptosuite_supported: jws.header.alg == ALG_EDDSA,
            detail: Vec::new(),
        };
        if !outcome.cryptosuite_supported {
            outcome.detail.push(format!("unsupported alg: {}", jws.header.alg));
        }

        if jws.is_sentinel() {
            outcome.method_resolved = true;
            outcome.purpose_valid = true;
            outcome.detail.push("signature verification failed".into());
            return outcome;
        }

        match self.resolve_key(&jws.header.kid).await {
            Ok((doc, key)) => {
                outcome.method_resolved = true;
                outcome.purpose_valid = doc.is_authorized(&jws.header.kid, purpose.as_str());
                if !outcome.purpose_valid {
                    outcome
                        .detail
                        .push(format!("{} is not authorised for {}", jws.header.kid, purpose));
                }
                match jws.verify_with(&key) {
                    Ok(()) => outcome.signature_valid = true,
                    Err(e) => outcome.detail.push(format!("signature verification failed: {}", e)),
                }
            }
            Err(e) => outcome.detail.push(format!("verification method not resolved: {}", e)),
        }

        outcome.valid = outcome.signature_valid
            && outcome.method_resolved
            && outcome.purpose_valid
            && outcome.cryptosuite_supported;
        outcome
    }
}

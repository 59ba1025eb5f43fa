//! Selective disclosure in SD-JWT form.
//!
//! Each disclosable claim becomes a salted token; the issuer signs an envelope
//! carrying only the tokens' digests. A presentation is
//! `<envelope>~<token>~<token>~`, where the holder picks which tokens to
//! include.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use vouch_core::{ClaimMap, ClaimValue};
use vouch_crypto::{Disclosure, SelectiveDisclosure};
use vouch_identity::jws::{encode_compact, CompactJws, TYP_SD_JWT};
use vouch_identity::proof::{timestamp_now, ProofEngine, ProofPurpose, Signer, VerificationOutcome};
use vouch_identity::{Credential, CredentialSubject, Issuer, Proof};

use crate::error::CredentialError;

pub const SD_SEPARATOR: char = '~';
pub const SD_ALG: &str = "sha-256";
pub const SD_JWT_PROOF: &str = "SdJwtEnvelope";

/// Claim name of the subject-identity disclosure. Never withheld.
pub const SUBJECT_ID_CLAIM: &str = "id";

const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 2100;

/// Signed envelope plus every disclosure token, as held by the holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureBundle {
    pub envelope: String,
    pub disclosures: Vec<String>,
}

impl DisclosureBundle {
    /// Serialize the envelope with the tokens for `selected` claims.
    pub fn present(&self, selected: &[&str]) -> String {
        present(self, selected)
    }
}

/// Split a credential into an SD envelope and disclosure tokens.
///
/// Names in `disclosable` that the subject does not carry are skipped.
/// `"id"` discloses the subject id. A credential carrying the sentinel proof
/// value yields an envelope with the sentinel signature.
pub fn encode(
    credential: &Credential,
    disclosable: &[&str],
    signer: &Signer<'_>,
) -> Result<DisclosureBundle, CredentialError> {
    let subject = &credential.credential_subject;
    let mut sd = SelectiveDisclosure::new();
    for name in disclosable {
        let value = if *name == SUBJECT_ID_CLAIM {
            Value::String(subject.id.clone())
        } else {
            match subject.claim(name) {
                Some(v) => v.to_json(),
                None => {
                    tracing::debug!(claim = name, "not in credential subject, skipping");
                    continue;
                }
            }
        };
        if sd.disclosure_for(name).is_none() {
            sd.add_claim(*name, value)?;
        }
    }

    let fallback_exp = Utc::now() + Duration::days(365);
    let mut payload = json!({
        "@context": credential.context,
        "id": credential.id,
        "type": credential.types,
        "iss": credential.issuer.id,
        "issuer": credential.issuer,
        "iat": timestamp_now().timestamp(),
        "validFrom": credential.valid_from,
        "nbf": credential.valid_from.timestamp(),
        "exp": credential.valid_until.unwrap_or(fallback_exp).timestamp(),
        "sub": subject.id,
        "credentialSubject": { "id": subject.id, "type": subject.subject_type },
        "_sd": sd.digests(),
        "_sd_alg": SD_ALG,
    });
    if let Value::Object(map) = &mut payload {
        if let Some(until) = credential.valid_until {
            map.insert("validUntil".into(), json!(until));
        }
        if let Some(status) = &credential.credential_status {
            map.insert("credentialStatus".into(), serde_json::to_value(status)?);
        }
        if let Some(schema) = &credential.credential_schema {
            map.insert("credentialSchema".into(), serde_json::to_value(schema)?);
        }
    }

    let sentinel = credential.proof.as_ref().is_some_and(Proof::is_sentinel);
    let envelope = encode_compact(&payload, TYP_SD_JWT, signer, sentinel)
        .map_err(|e| CredentialError::SigningFailure(e.to_string()))?;

    tracing::info!(
        credential_id = %credential.id,
        disclosures = sd.len(),
        "SD-JWT envelope created"
    );

    Ok(DisclosureBundle {
        envelope,
        disclosures: sd.tokens(),
    })
}

/// Join the envelope with the tokens for `selected` claims. Unknown names
/// are silently omitted; the subject-id token is always kept.
pub fn present(bundle: &DisclosureBundle, selected: &[&str]) -> String {
    let mut out = bundle.envelope.clone();
    out.push(SD_SEPARATOR);
    for token in &bundle.disclosures {
        let keep = match Disclosure::decode(token) {
            Ok(d) => d.claim_name() == SUBJECT_ID_CLAIM || selected.contains(&d.claim_name()),
            Err(e) => {
                tracing::warn!(error = %e, "undecodable disclosure in bundle, dropping");
                false
            }
        };
        if keep {
            out.push_str(token);
            out.push(SD_SEPARATOR);
        }
    }
    out
}

/// Whether a string looks like an SD presentation.
pub fn is_sd_presentation(value: &str) -> bool {
    value.contains(SD_SEPARATOR)
}

struct Decoded {
    envelope: CompactJws,
    credential: Credential,
}

fn decode_parts(presentation: &str) -> Result<Decoded, CredentialError> {
    let mut parts = presentation.split(SD_SEPARATOR);
    let jwt = parts.next().unwrap_or_default();
    if !is_sd_presentation(presentation) || jwt.is_empty() {
        return Err(CredentialError::MalformedPresentation(
            "expected <envelope>~<disclosures>".into(),
        ));
    }

    let envelope = CompactJws::parse(jwt)
        .map_err(|e| CredentialError::MalformedPresentation(e.to_string()))?;
    let payload = envelope
        .payload
        .as_object()
        .ok_or_else(|| CredentialError::MalformedPresentation("payload is not an object".into()))?;

    match payload.get("_sd_alg").and_then(Value::as_str) {
        Some(SD_ALG) => {}
        other => {
            return Err(CredentialError::MalformedPresentation(format!(
                "unsupported _sd_alg: {:?}",
                other
            )))
        }
    }
    let digests: Vec<String> = payload
        .get("_sd")
        .and_then(Value::as_array)
        .ok_or_else(|| CredentialError::MalformedPresentation("missing _sd".into()))?
        .iter()
        .filter_map(|d| d.as_str().map(str::to_string))
        .collect();

    let sub = str_field(payload, "sub")?;
    let subject_type = payload
        .get("credentialSubject")
        .and_then(|s| s.get("type"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut claims = ClaimMap::new();
    let mut seen = BTreeSet::new();
    for token in parts.filter(|t| !t.is_empty()) {
        let disclosure = Disclosure::verify_against(token, &digests)
            .map_err(|e| CredentialError::TokenMismatch(e.to_string()))?;
        if !seen.insert(disclosure.digest()) {
            continue;
        }
        if disclosure.claim_name() == SUBJECT_ID_CLAIM {
            if disclosure.value().as_str() != Some(sub.as_str()) {
                return Err(CredentialError::MalformedPresentation(
                    "disclosed subject id differs from sub".into(),
                ));
            }
            continue;
        }
        let value = ClaimValue::try_from(disclosure.value().clone())
            .map_err(|e| CredentialError::MalformedPresentation(e.to_string()))?;
        claims.insert(disclosure.claim_name().to_string(), value);
    }

    let now = Utc::now();
    let valid_from = clamp_timestamp("nbf", payload.get("nbf"), now);
    let valid_until = clamp_timestamp("exp", payload.get("exp"), now + Duration::days(365));
    let created = clamp_timestamp("iat", payload.get("iat"), now);

    let issuer: Issuer = match payload.get("issuer") {
        Some(v) => serde_json::from_value(v.clone())?,
        None => Issuer {
            id: str_field(payload, "iss")?,
            name: String::new(),
            image: None,
        },
    };

    let credential = Credential {
        context: opt_field(payload, "@context")?.unwrap_or_default(),
        id: str_field(payload, "id")?,
        types: opt_field(payload, "type")?.unwrap_or_default(),
        issuer,
        valid_from,
        valid_until: Some(valid_until),
        credential_subject: CredentialSubject::new(sub, subject_type, claims),
        credential_status: opt_field(payload, "credentialStatus")?,
        credential_schema: opt_field(payload, "credentialSchema")?,
        // Claims left out of `_sd` at encoding are withheld too.
        selectively_disclosed: true,
        proof: Some(Proof {
            proof_type: SD_JWT_PROOF.to_string(),
            created,
            verification_method: envelope.header.kid.clone(),
            proof_purpose: ProofPurpose::AssertionMethod.as_str().to_string(),
            cryptosuite: envelope.header.alg.clone(),
            proof_value: presentation.to_string(),
            challenge: None,
            domain: None,
        }),
    };

    Ok(Decoded { envelope, credential })
}

/// Rebuild a credential from a presentation string. Every token must match a
/// digest in the envelope. The result is always flagged as selectively
/// disclosed. The envelope signature is not checked here; see
/// [`verify`].
pub fn decode(presentation: &str) -> Result<Credential, CredentialError> {
    decode_parts(presentation).map(|d| d.credential)
}

/// Decode and check the envelope signature through the proof engine.
pub async fn verify(
    presentation: &str,
    engine: &ProofEngine,
) -> Result<(Credential, VerificationOutcome), CredentialError> {
    let decoded = decode_parts(presentation)?;
    let outcome = engine
        .verify_jws(&decoded.envelope, ProofPurpose::AssertionMethod)
        .await;
    Ok((decoded.credential, outcome))
}

fn str_field(payload: &Map<String, Value>, key: &str) -> Result<String, CredentialError> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CredentialError::MalformedPresentation(format!("missing {}", key)))
}

fn opt_field<T: serde::de::DeserializeOwned>(
    payload: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>, CredentialError> {
    payload
        .get(key)
        .map(|v| serde_json::from_value(v.clone()))
        .transpose()
        .map_err(|e| CredentialError::MalformedPresentation(format!("{}: {}", key, e)))
}

/// Epoch seconds to a date within [1970, 2100]; anything else is replaced by
/// `fallback` and logged.
fn clamp_timestamp(field: &str, value: Option<&Value>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let secs = value.and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));
    let parsed = secs
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .filter(|dt| (MIN_YEAR..=MAX_YEAR).contains(&dt.year()));
    match parsed {
        Some(dt) => dt,
        None => {
            tracing::warn!(
                field,
                value = ?value,
                fallback = %fallback,
                "envelope timestamp missing or outside 1970-2100, substituting fallback"
            );
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vouch_crypto::{b64url_encode, KeyPair};
    use vouch_identity::credentials::CredentialStatus;
    use vouch_identity::{key_did, KeyDidResolver};

    fn credential(issuer_did: &str) -> Credential {
        let mut claims = ClaimMap::new();
        claims.insert("name".into(), "Alice".into());
        claims.insert("dateOfBirth".into(), "1990-01-01".into());
        claims.insert("address".into(), "Tokyo".into());
        let mut vc = Credential::new(
            Issuer {
                id: issuer_did.into(),
                name: "Issuer".into(),
                image: None,
            },
            vec!["PersonalInfoCredential".into()],
            CredentialSubject::new("did:vouch:key:holder", "Person", claims),
            Utc::now(),
        )
        .with_valid_until(Utc::now() + Duration::days(30));
        vc.credential_status = Some(CredentialStatus::revocation("https://x.example/status", 3));
        vc
    }

    fn bundle() -> (KeyPair, String, Credential, DisclosureBundle) {
        let kp = KeyPair::from_seed(&[4u8; 32]);
        let did = key_did(&kp.public_key());
        let vc = credential(&did);
        let signer = Signer::new(&did, &kp);
        let bundle = encode(&vc, &["id", "name", "dateOfBirth", "address"], &signer).unwrap();
        (kp, did, vc, bundle)
    }

    fn claim_names(vc: &Credential) -> Vec<&str> {
        vc.credential_subject.claims.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_envelope_carries_digests_not_values() {
        let (_, did, _, bundle) = bundle();
        let jws = CompactJws::parse(&bundle.envelope).unwrap();
        assert_eq!(jws.payload["_sd"].as_array().unwrap().len(), 4);
        assert_eq!(jws.payload["_sd_alg"], SD_ALG);
        assert_eq!(jws.payload["iss"], did.as_str());
        assert!(!bundle.envelope.contains("Alice"));
        assert!(!jws.payload.to_string().contains("Tokyo"));
        assert_eq!(bundle.disclosures.len(), 4);
    }

    #[test]
    fn test_present_decode_subset() {
        let (_, _, vc, bundle) = bundle();
        let presented = bundle.present(&["name"]);
        assert!(presented.ends_with('~'));

        let decoded = decode(&presented).unwrap();
        assert_eq!(claim_names(&decoded), vec!["name"]);
        assert_eq!(decoded.credential_subject.id, vc.credential_subject.id);
        assert_eq!(decoded.credential_subject.subject_type, "Person");
        assert_eq!(decoded.id, vc.id);
        assert_eq!(decoded.credential_status, vc.credential_status);
        assert!(decoded.selectively_disclosed);
        assert_eq!(decoded.proof.as_ref().unwrap().proof_value, presented);
    }

    #[test]
    fn test_present_all_and_none() {
        let (_, _, _, bundle) = bundle();
        let all = decode(&bundle.present(&["name", "dateOfBirth", "address"])).unwrap();
        assert_eq!(claim_names(&all), vec!["address", "dateOfBirth", "name"]);
        assert!(all.selectively_disclosed);

        let none = decode(&bundle.present(&[])).unwrap();
        assert!(none.credential_subject.claims.is_empty());
        assert_eq!(none.credential_subject.id, "did:vouch:key:holder");
    }

    #[test]
    fn test_unknown_selection_omitted() {
        let (_, _, _, bundle) = bundle();
        let presented = bundle.present(&["name", "favouriteColour"]);
        assert_eq!(presented.matches('~').count(), 3);
        assert_eq!(claim_names(&decode(&presented).unwrap()), vec!["name"]);
    }

    #[test]
    fn test_encode_skips_unknown_disclosable() {
        let kp = KeyPair::generate();
        let did = key_did(&kp.public_key());
        let signer = Signer::new(&did, &kp);
        let bundle = encode(&credential(&did), &["name", "salary"], &signer).unwrap();
        assert_eq!(bundle.disclosures.len(), 1);
    }

    #[test]
    fn test_narrow_disclosable_set_is_flagged() {
        let kp = KeyPair::generate();
        let did = key_did(&kp.public_key());
        let bundle = encode(&credential(&did), &["name"], &Signer::new(&did, &kp)).unwrap();

        // Every token presented, yet the other claims were never disclosable.
        let decoded = decode(&bundle.present(&["name"])).unwrap();
        assert_eq!(claim_names(&decoded), vec!["name"]);
        assert!(decoded.selectively_disclosed);
    }

    #[test]
    fn test_forged_token_is_token_mismatch() {
        let (_, _, _, bundle) = bundle();
        let forged = Disclosure::new("name", json!("Mallory")).unwrap();
        let presented = format!("{}~{}~", bundle.envelope, forged.encoded());
        assert!(matches!(decode(&presented), Err(CredentialError::TokenMismatch(_))));
    }

    #[test]
    fn test_malformed_presentations() {
        assert!(matches!(decode("no-separator"), Err(CredentialError::MalformedPresentation(_))));
        assert!(matches!(decode("~abc~"), Err(CredentialError::MalformedPresentation(_))));
        assert!(matches!(decode("a.b.c~"), Err(CredentialError::MalformedPresentation(_))));
    }

    #[test]
    fn test_out_of_range_timestamps_fall_back() {
        let kp = KeyPair::generate();
        let did = key_did(&kp.public_key());
        let payload = json!({
            "id": "urn:uuid:x", "sub": "did:vouch:key:h", "iss": did,
            "nbf": -100_000_000_000i64, "exp": 9_999_999_999_999i64,
            "credentialSubject": {"id": "did:vouch:key:h", "type": "Person"},
            "_sd": [], "_sd_alg": SD_ALG,
        });
        let jwt = encode_compact(&payload, TYP_SD_JWT, &Signer::new(&did, &kp), false).unwrap();
        let before = Utc::now();
        let decoded = decode(&format!("{}~", jwt)).unwrap();

        assert!(decoded.valid_from >= before - Duration::seconds(1));
        let until = decoded.valid_until.unwrap();
        assert!(until > before + Duration::days(364));
        assert!(until < before + Duration::days(366));
        assert_eq!(decoded.issuer.id, did);
    }

    #[test]
    fn test_unlisted_id_token_rejected() {
        let (_, _, _, bundle) = bundle();
        let not_listed = b64url_encode(r#"["s","id","did:vouch:key:other"]"#);
        let presented = format!("{}~{}~", bundle.envelope, not_listed);
        assert!(matches!(decode(&presented), Err(CredentialError::TokenMismatch(_))));
    }

    #[tokio::test]
    async fn test_verify_envelope_signature() {
        let (_, _, _, bundle) = bundle();
        let engine = ProofEngine::new(Arc::new(KeyDidResolver));
        let (vc, outcome) = verify(&bundle.present(&["address"]), &engine).await.unwrap();
        assert!(outcome.valid, "{:?}", outcome.detail);
        assert_eq!(claim_names(&vc), vec!["address"]);
    }

    #[tokio::test]
    async fn test_verify_detects_foreign_signer() {
        let (_, did, vc, _) = bundle();
        let impostor = KeyPair::generate();
        let forged = encode(&vc, &["name"], &Signer::new(&did, &impostor)).unwrap();
        let engine = ProofEngine::new(Arc::new(KeyDidResolver));
        let (_, outcome) = verify(&forged.present(&["name"]), &engine).await.unwrap();
        assert!(outcome.method_resolved);
        assert!(!outcome.signature_valid);
    }
}

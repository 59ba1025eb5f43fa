use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vouch_core::{ClaimMap, ClaimValue};

use crate::proof::Proof;

pub const CREDENTIALS_CONTEXT_V2: &str = "https://www.w3.org/ns/credentials/v2";
pub const VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";
pub const STATUS_LIST_ENTRY: &str = "StatusList2021Entry";
pub const JSON_SCHEMA: &str = "JsonSchema";

/// Subject claim recording how the holder intends to present the credential.
/// It is metadata, never a disclosable claim.
pub const PRESENTATION_FORMAT_CLAIM: &str = "presentationFormat";

/// Issuer of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The holder and the claims made about them.
///
/// `id` and `type` are structural; every other member is a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSubject {
    pub id: String,
    #[serde(rename = "type")]
    pub subject_type: String,
    #[serde(flatten)]
    pub claims: ClaimMap,
}

impl CredentialSubject {
    pub fn new(id: impl Into<String>, subject_type: impl Into<String>, claims: ClaimMap) -> Self {
        Self {
            id: id.into(),
            subject_type: subject_type.into(),
            claims,
        }
    }

    /// Claim names a holder may choose to disclose, in name order.
    pub fn disclosable_claims(&self) -> Vec<&str> {
        self.claims
            .keys()
            .map(String::as_str)
            .filter(|name| *name != PRESENTATION_FORMAT_CLAIM)
            .collect()
    }

    pub fn claim(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name)
    }
}

/// Pointer into a revocation status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    /// `<status list URL>#<index>`
    pub id: String,
    #[serde(rename = "type")]
    pub status_type: String,
    pub status_purpose: String,
    pub status_list_index: String,
    pub status_list_credential: String,
}

impl CredentialStatus {
    pub fn revocation(list: &str, index: u64) -> Self {
        Self {
            id: format!("{}#{}", list, index),
            status_type: STATUS_LIST_ENTRY.to_string(),
            status_purpose: "revocation".to_string(),
            status_list_index: index.to_string(),
            status_list_credential: list.to_string(),
        }
    }

    pub fn index(&self) -> Option<u64> {
        self.status_list_index.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub schema_type: String,
}

impl CredentialSchema {
    pub fn json_schema(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schema_type: JSON_SCHEMA.to_string(),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A W3C Verifiable Credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub issuer: Issuer,
    pub valid_from: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub credential_subject: CredentialSubject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<CredentialSchema>,
    /// Set when the subject was cut down to a subset of the issued claims.
    #[serde(rename = "_selectivelyDisclosed", default, skip_serializing_if = "is_false")]
    pub selectively_disclosed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl Credential {
    /// Create an unsigned credential with a fresh `urn:uuid` id.
    ///
    /// `VerifiableCredential` is always the first type.
    pub fn new(
        issuer: Issuer,
        types: Vec<String>,
        subject: CredentialSubject,
        valid_from: DateTime<Utc>,
    ) -> Self {
        let mut all_types = vec![VERIFIABLE_CREDENTIAL.to_string()];
        for t in types {
            if t != VERIFIABLE_CREDENTIAL && !all_types.contains(&t) {
                all_types.push(t);
            }
        }

        Self {
            context: vec![CREDENTIALS_CONTEXT_V2.to_string()],
            id: format!("urn:uuid:{}", Uuid::new_v4()),
            types: all_types,
            issuer,
            valid_from,
            valid_until: None,
            credential_subject: subject,
            credential_status: None,
            credential_schema: None,
            selectively_disclosed: false,
            proof: None,
        }
    }

    pub fn with_valid_until(mut self, valid_until: DateTime<Utc>) -> Self {
        self.valid_until = Some(valid_until);
        self
    }

    /// The most specific type tag, used for display.
    pub fn display_type(&self) -> &str {
        self.types.last().map(String::as_str).unwrap_or(VERIFIABLE_CREDENTIAL)
    }

    /// Whether `at` lies within `[validFrom, validUntil]`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.valid_from && self.valid_until.map_or(true, |until| at <= until)
    }

    /// Copy of this credential without its proof.
    pub fn unsigned(&self) -> Self {
        Self {
            proof: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample() -> Credential {
        let mut claims = ClaimMap::new();
        claims.insert("name".into(), "Alice".into());
        claims.insert("age".into(), ClaimValue::from(30));
        claims.insert(PRESENTATION_FORMAT_CLAIM.into(), "vp".into());
        Credential::new(
            Issuer {
                id: "did:web:issuer.example.com".into(),
                name: "Issuer".into(),
                image: None,
            },
            vec!["VerifiableCredential".into(), "PersonalInfoCredential".into()],
            CredentialSubject::new("did:vouch:key:abc", "Person", claims),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_credential() {
        let vc = sample();
        assert!(vc.id.starts_with("urn:uuid:"));
        assert_eq!(vc.types, vec!["VerifiableCredential", "PersonalInfoCredential"]);
        assert_eq!(vc.display_type(), "PersonalInfoCredential");
        assert!(vc.proof.is_none());
    }

    #[test]
    fn test_json_shape() {
        let vc = sample();
        let json = serde_json::to_value(&vc).unwrap();

        assert_eq!(json["@context"][0], CREDENTIALS_CONTEXT_V2);
        assert_eq!(json["type"][1], "PersonalInfoCredential");
        assert_eq!(json["credentialSubject"]["id"], "did:vouch:key:abc");
        assert_eq!(json["credentialSubject"]["type"], "Person");
        assert_eq!(json["credentialSubject"]["name"], "Alice");
        assert_eq!(json["credentialSubject"]["age"], 30);
        assert!(json.get("validFrom").is_some());
        assert!(json.get("validUntil").is_none());
        assert!(json.get("_selectivelyDisclosed").is_none());
        assert!(json.get("proof").is_none());
    }

    #[test]
    fn test_roundtrip_preserves_claims() {
        let vc = sample().with_valid_until(Utc::now() + Duration::days(1));
        let json = serde_json::to_string(&vc).unwrap();
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vc);
    }

    #[test]
    fn test_subject_rejects_null_claim() {
        let value = json!({"id": "did:web:a.example", "type": "Person", "name": null});
        assert!(serde_json::from_value::<CredentialSubject>(value).is_err());
    }

    #[test]
    fn test_disclosable_claims_skip_format_marker() {
        let vc = sample();
        assert_eq!(vc.credential_subject.disclosable_claims(), vec!["age", "name"]);
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let vc = sample().with_valid_until(now + Duration::hours(1));
        assert!(vc.is_valid_at(now));
        assert!(!vc.is_valid_at(now + Duration::hours(2)));
        assert!(!vc.is_valid_at(vc.valid_from - Duration::seconds(1)));

        let open_ended = sample();
        assert!(open_ended.is_valid_at(now + Duration::days(10_000)));
    }

    #[test]
    fn test_status_entry() {
        let status = CredentialStatus::revocation("https://issuer.example.com/status/1", 7);
        assert_eq!(status.id, "https://issuer.example.com/status/1#7");
        assert_eq!(status.index(), Some(7));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["type"], STATUS_LIST_ENTRY);
        assert_eq!(json["statusListIndex"], "7");
    }
}

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use vouch_core::{is_valid_did, ClaimMap, ClaimValue};
use vouch_identity::credentials::VERIFIABLE_CREDENTIAL;
use vouch_identity::presentation::VERIFIABLE_PRESENTATION;
use vouch_identity::{Credential, Presentation};

use crate::error::CredentialError;

pub const PERSONAL_INFO_V1: &str = "personal-info-v1";

/// Expected shape of a claim value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    String,
    /// ISO 8601 calendar date, carried as a string.
    Date,
    Number,
    Boolean,
    Object,
}

impl ClaimType {
    fn accepts(&self, value: &ClaimValue) -> bool {
        matches!(
            (self, value),
            (Self::String | Self::Date, ClaimValue::String(_))
                | (Self::Number, ClaimValue::Number(_))
                | (Self::Boolean, ClaimValue::Bool(_))
                | (Self::Object, ClaimValue::Map(_))
        )
    }
}

/// Definition of a claim within a credential schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDefinition {
    pub name: String,
    pub value_type: ClaimType,
    pub required: bool,
    pub description: Option<String>,
}

/// A named set of claim definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub claims: Vec<ClaimDefinition>,
}

impl SchemaDefinition {
    pub fn required_claims(&self) -> impl Iterator<Item = &str> {
        self.claims
            .iter()
            .filter(|c| c.required)
            .map(|c| c.name.as_str())
    }
}

/// Registry of credential schemas.
pub struct SchemaRegistry {
    schemas: DashMap<String, SchemaDefinition>,
}

impl SchemaRegistry {
    /// Create a new registry with built-in schemas.
    pub fn new() -> Self {
        let registry = Self {
            schemas: DashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&self) {
        let claim = |name: &str, value_type, description: &str| ClaimDefinition {
            name: name.into(),
            value_type,
            required: true,
            description: Some(description.into()),
        };
        self.schemas.insert(
            PERSONAL_INFO_V1.into(),
            SchemaDefinition {
                id: PERSONAL_INFO_V1.into(),
                name: "Personal Information".into(),
                version: "1.0.0".into(),
                description: "Name, date of birth and postal address".into(),
                claims: vec![
                    claim("name", ClaimType::String, "Full name"),
                    claim("dateOfBirth", ClaimType::Date, "Date of birth (ISO 8601)"),
                    claim("address", ClaimType::String, "Postal address"),
                ],
            },
        );
    }

    /// Register a custom schema.
    pub fn register(&self, schema: SchemaDefinition) -> Result<(), CredentialError> {
        if schema.claims.is_empty() {
            return Err(CredentialError::SchemaViolation(
                "schema must have at least one claim".into(),
            ));
        }
        self.schemas.insert(schema.id.clone(), schema);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<SchemaDefinition> {
        self.schemas.get(id).map(|entry| entry.clone())
    }

    pub fn list(&self) -> Vec<String> {
        self.schemas.iter().map(|e| e.key().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.schemas.len()
    }

    /// All problems with `claims` under a registered schema.
    pub fn claim_violations(
        &self,
        schema_id: &str,
        claims: &ClaimMap,
    ) -> Result<Vec<String>, CredentialError> {
        let schema = self
            .get(schema_id)
            .ok_or_else(|| CredentialError::SchemaNotFound(schema_id.to_string()))?;

        let mut violations = Vec::new();
        for def in &schema.claims {
            match claims.get(&def.name) {
                None if def.required => {
                    violations.push(format!("missing required claim: {}", def.name))
                }
                Some(value) if !def.value_type.accepts(value) => violations.push(format!(
                    "claim {} should be {:?}",
                    def.name, def.value_type
                )),
                _ => {}
            }
        }
        Ok(violations)
    }

    /// Validate claims against a schema.
    pub fn validate_claims(
        &self,
        schema_id: &str,
        claims: &ClaimMap,
    ) -> Result<(), CredentialError> {
        let violations = self.claim_violations(schema_id, claims)?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CredentialError::SchemaViolation(violations.join("; ")))
        }
    }

    /// Structural problems with a credential. Claim rules (at least one
    /// claim, registered-schema requirements) are skipped for selectively
    /// disclosed subjects.
    pub fn credential_violations(&self, credential: &Credential) -> Vec<String> {
        let mut errors = Vec::new();
        if credential.context.is_empty() {
            errors.push("@context is empty".to_string());
        }
        if !credential.types.iter().any(|t| t == VERIFIABLE_CREDENTIAL) {
            errors.push("type must include VerifiableCredential".to_string());
        }
        if credential.issuer.id.is_empty() {
            errors.push("issuer id is missing".to_string());
        }
        let subject = &credential.credential_subject;
        if !is_valid_did(&subject.id) {
            errors.push(format!("credentialSubject.id is not a valid DID: {}", subject.id));
        }
        if subject.subject_type.is_empty() {
            errors.push("credentialSubject.type is empty".to_string());
        }
        if credential.selectively_disclosed {
            return errors;
        }

        if subject.disclosable_claims().is_empty() {
            errors.push("credentialSubject carries no claims".to_string());
        }
        if let Some(schema) = &credential.credential_schema {
            if let Ok(violations) = self.claim_violations(&schema.id, &subject.claims) {
                errors.extend(violations);
            }
        }
        errors
    }

    pub fn presentation_violations(&self, presentation: &Presentation) -> Vec<String> {
        let mut errors = Vec::new();
        if !presentation.types.iter().any(|t| t == VERIFIABLE_PRESENTATION) {
            errors.push("type must include VerifiablePresentation".to_string());
        }
        if !is_valid_did(&presentation.holder) {
            errors.push(format!("holder is not a valid DID: {}", presentation.holder));
        }
        if presentation.verifiable_credential.is_empty() {
            errors.push("presentation carries no credentials".to_string());
        }
        for (i, vc) in presentation.verifiable_credential.iter().enumerate() {
            for e in self.credential_violations(vc) {
                errors.push(format!("verifiableCredential[{}]: {}", i, e));
            }
        }
        errors
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

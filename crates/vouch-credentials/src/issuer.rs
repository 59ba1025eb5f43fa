use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use vouch_core::{validate_did, ClaimMap, EngineConfig};
use vouch_crypto::{KeyPair, PublicKey};
use vouch_identity::proof::{sign, timestamp_now, ProofOptions, ProofPurpose, Signer};
use vouch_identity::{Credential, CredentialSchema, CredentialSubject, Issuer};

use crate::error::CredentialError;
use crate::revocation::RevocationRegistry;
use crate::schema::SchemaRegistry;

/// Issuer DID substituted by [`ErrorInjection::invalid_issuer`]. The
/// underscore makes it syntactically invalid.
pub const INVALID_ISSUER_DID: &str = "did:web:invalid_issuer.example.com";

pub const DEFAULT_SUBJECT_TYPE: &str = "Person";

/// Deliberate defects for conformance testing. Each flag is independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorInjection {
    /// Replace the issuer id with [`INVALID_ISSUER_DID`].
    pub invalid_issuer: bool,
    /// Set `validUntil` one second in the past.
    pub expired: bool,
    /// Issue with no subject claims.
    pub missing_fields: bool,
    /// Emit the sentinel proof value instead of a signature.
    pub invalid_signature: bool,
    /// Revoke immediately after issuance.
    pub revoked: bool,
}

impl ErrorInjection {
    pub fn any(&self) -> bool {
        self.invalid_issuer
            || self.expired
            || self.missing_fields
            || self.invalid_signature
            || self.revoked
    }
}

#[derive(Debug, Clone, Default)]
pub struct IssueOptions {
    /// Type tags; the issuer's defaults when empty.
    pub types: Vec<String>,
    pub subject_type: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    /// Schema to reference; the issuer's default when `None`.
    pub schema_id: Option<String>,
    pub inject: ErrorInjection,
}

/// Composes, signs and registers credentials.
pub struct CredentialIssuer {
    profile: Issuer,
    keypair: KeyPair,
    registry: Arc<RevocationRegistry>,
    schemas: Arc<SchemaRegistry>,
    validity: Duration,
    default_types: Vec<String>,
    default_schema: Option<String>,
}

impl CredentialIssuer {
    pub fn new(
        profile: Issuer,
        keypair: KeyPair,
        registry: Arc<RevocationRegistry>,
        schemas: Arc<SchemaRegistry>,
    ) -> Result<Self, CredentialError> {
        validate_did(&profile.id)?;
        Ok(Self {
            profile,
            keypair,
            registry,
            schemas,
            validity: Duration::days(365),
            default_types: vec!["VerifiableCredential".into()],
            default_schema: None,
        })
    }

    /// Build an issuer from the `[issuer]` and `[credentials]` config sections.
    pub fn from_config(
        config: &EngineConfig,
        keypair: KeyPair,
        registry: Arc<RevocationRegistry>,
        schemas: Arc<SchemaRegistry>,
    ) -> Result<Self, CredentialError> {
        let profile = Issuer {
            id: config.issuer.did.clone(),
            name: config.issuer.name.clone(),
            image: config.issuer.image.clone(),
        };
        let mut issuer = Self::new(profile, keypair, registry, schemas)?;
        issuer.validity = Duration::days(config.credentials.validity_days);
        issuer.default_types = config.credentials.default_types.clone();
        issuer.default_schema = config.credentials.schema_id.clone();
        Ok(issuer)
    }

    pub fn with_default_schema(mut self, schema_id: Option<String>) -> Self {
        self.default_schema = schema_id;
        self
    }

    pub fn did(&self) -> &str {
        &self.profile.id
    }

    pub fn profile(&self) -> &Issuer {
        &self.profile
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn registry(&self) -> &Arc<RevocationRegistry> {
        &self.registry
    }

    /// Signer bound to the issuer's primary key.
    pub fn signer(&self) -> Signer<'_> {
        Signer::new(&self.profile.id, &self.keypair)
    }

    /// Issue a signed credential to `subject_did`.
    pub fn issue(
        &self,
        subject_did: &str,
        claims: ClaimMap,
        options: &IssueOptions,
    ) -> Result<Credential, CredentialError> {
        validate_did(subject_did)?;
        let inject = options.inject;

        let claims = if inject.missing_fields { ClaimMap::new() } else { claims };
        let schema_id = options.schema_id.clone().or_else(|| self.default_schema.clone());
        if let (Some(id), false) = (&schema_id, inject.missing_fields) {
            if self.schemas.get(id).is_some() {
                self.schemas.validate_claims(id, &claims)?;
            }
        }

        let now = timestamp_now();
        let valid_from = options.valid_from.unwrap_or(now);
        let valid_until = if inject.expired {
            now - Duration::seconds(1)
        } else {
            options.valid_until.unwrap_or(valid_from + self.validity)
        };

        let mut profile = self.profile.clone();
        if inject.invalid_issuer {
            profile.id = INVALID_ISSUER_DID.to_string();
        }

        let types = if options.types.is_empty() {
            self.default_types.clone()
        } else {
            options.types.clone()
        };
        let subject_type = options
            .subject_type
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBJECT_TYPE.to_string());

        let mut vc = Credential::new(
            profile,
            types,
            CredentialSubject::new(subject_did, subject_type, claims),
            valid_from,
        )
        .with_valid_until(valid_until);
        vc.credential_schema = schema_id.map(CredentialSchema::json_schema);
        vc.credential_status = Some(self.registry.allocate(&vc.id)?);

        let proof_options =
            ProofOptions::default().with_invalid_signature(inject.invalid_signature);
        let proof = sign(&vc, &self.signer(), ProofPurpose::AssertionMethod, &proof_options)
            .map_err(|e| CredentialError::SigningFailure(e.to_string()))?;
        vc.proof = Some(proof);

        if inject.revoked {
            self.registry.revoke(&vc.id)?;
        }

        tracing::info!(
            issuer = %self.profile.id,
            subject = subject_did,
            credential_id = %vc.id,
            injected = inject.any(),
            "credential issued"
        );

        Ok(vc)
    }

    /// Revoke a credential this issuer registered.
    pub fn revoke(&self, credential_id: &str) -> Result<(), CredentialError> {
        self.registry.revoke(credential_id)
    }
}

use vouch_core::validate_did;
use vouch_crypto::KeyPair;
use vouch_identity::credentials::PRESENTATION_FORMAT_CLAIM;
use vouch_identity::proof::{sign, ProofOptions, ProofPurpose, Signer};
use vouch_identity::{Credential, Presentation};

use crate::error::CredentialError;

/// Copy of `credential` whose subject keeps only `id`, `type`, the format
/// marker and the `disclosed` claims.
///
/// If `disclosed` covers every disclosable claim the copy is identical to the
/// input. Otherwise it is flagged as selectively disclosed, which is the only
/// signal verifiers use to tell a cut-down subject from a tampered one.
pub fn filter_subject(credential: &Credential, disclosed: &[&str]) -> Credential {
    let available = credential.credential_subject.disclosable_claims();
    if available.iter().all(|name| disclosed.contains(name)) {
        return credential.clone();
    }

    let mut filtered = credential.clone();
    filtered
        .credential_subject
        .claims
        .retain(|name, _| name == PRESENTATION_FORMAT_CLAIM || disclosed.contains(&name.as_str()));
    filtered.selectively_disclosed = true;
    filtered
}

/// Wraps credentials in a presentation signed by the holder.
pub struct PresentationBuilder<'a> {
    holder: String,
    keypair: &'a KeyPair,
    options: ProofOptions,
}

impl<'a> PresentationBuilder<'a> {
    pub fn new(holder_did: &str, keypair: &'a KeyPair) -> Result<Self, CredentialError> {
        validate_did(holder_did)?;
        Ok(Self {
            holder: holder_did.to_string(),
            keypair,
            options: ProofOptions::default(),
        })
    }

    /// Bind the presentation proof to a verifier challenge.
    pub fn with_challenge(
        mut self,
        challenge: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        self.options = self.options.with_challenge(challenge, domain);
        self
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Present one credential disclosing only `disclosed` claims.
    pub fn wrap(
        &self,
        credential: &Credential,
        disclosed: &[&str],
    ) -> Result<Presentation, CredentialError> {
        self.wrap_all(vec![filter_subject(credential, disclosed)])
    }

    /// Present several credentials as they are.
    pub fn wrap_all(&self, credentials: Vec<Credential>) -> Result<Presentation, CredentialError> {
        let mut presentation = Presentation::new(self.holder.clone(), credentials);
        let signer = Signer::new(&self.holder, self.keypair);
        let proof = sign(&presentation, &signer, ProofPurpose::AssertionMethod, &self.options)
            .map_err(|e| CredentialError::SigningFailure(e.to_string()))?;
        presentation.proof = Some(proof);

        tracing::info!(
            presentation_id = %presentation.id,
            holder = %self.holder,
            credentials = presentation.verifiable_credential.len(),
            partial = presentation.verifiable_credential.iter().any(|vc| vc.selectively_disclosed),
            "presentation created"
        );
        Ok(presentation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vouch_core::ClaimMap;
    use vouch_identity::{key_did, CredentialSubject, Issuer};

    fn credential(holder: &str) -> Credential {
        let mut claims = ClaimMap::new();
        claims.insert("name".into(), "Alice".into());
        claims.insert("dateOfBirth".into(), "1990-01-01".into());
        claims.insert("address".into(), "Tokyo".into());
        claims.insert(PRESENTATION_FORMAT_CLAIM.into(), "vp".into());
        Credential::new(
            Issuer {
                id: "did:web:issuer.example.com".into(),
                name: "Issuer".into(),
                image: None,
            },
            vec!["PersonalInfoCredential".into()],
            CredentialSubject::new(holder, "Person", claims),
            Utc::now(),
        )
    }

    #[test]
    fn test_full_disclosure_unmodified() {
        let vc = credential("did:vouch:key:holder");
        let out = filter_subject(&vc, &["address", "dateOfBirth", "name"]);
        assert_eq!(out, vc);
        assert_eq!(
            serde_json::to_vec(&out.credential_subject).unwrap(),
            serde_json::to_vec(&vc.credential_subject).unwrap()
        );
        assert!(!out.selectively_disclosed);
    }

    #[test]
    fn test_strict_subset_filtered_and_flagged() {
        let vc = credential("did:vouch:key:holder");
        let out = filter_subject(&vc, &["name"]);
        let names: Vec<&str> = out.credential_subject.claims.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", PRESENTATION_FORMAT_CLAIM]);
        assert_eq!(out.credential_subject.id, vc.credential_subject.id);
        assert_eq!(out.credential_subject.subject_type, "Person");
        assert!(out.selectively_disclosed);
        assert!(!vc.selectively_disclosed);
    }

    #[test]
    fn test_empty_disclosure_is_partial() {
        let out = filter_subject(&credential("did:vouch:key:holder"), &[]);
        assert!(out.selectively_disclosed);
        assert_eq!(out.credential_subject.disclosable_claims(), Vec::<&str>::new());
    }

    #[test]
    fn test_wrap_signs_as_holder() {
        let kp = KeyPair::generate();
        let holder = key_did(&kp.public_key());
        let builder = PresentationBuilder::new(&holder, &kp).unwrap();
        let vp = builder.wrap(&credential(&holder), &["name"]).unwrap();

        let proof = vp.proof.as_ref().unwrap();
        assert_eq!(proof.verification_method, format!("{}#key-1", holder));
        assert_eq!(proof.proof_purpose, "assertionMethod");
        assert_eq!(vp.holder, holder);
        assert!(vp.verifiable_credential[0].selectively_disclosed);
    }

    #[test]
    fn test_rejects_malformed_holder() {
        let kp = KeyPair::generate();
        assert!(matches!(
            PresentationBuilder::new("holder", &kp),
            Err(CredentialError::MalformedIdentifier(_))
        ));
    }
}

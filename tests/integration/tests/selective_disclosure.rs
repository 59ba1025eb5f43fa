//! Integration test: SD-JWT disclosure and presentation wrapping.

use vouch_credentials::sd_jwt;
use vouch_credentials::{CredentialError, ErrorInjection, Format, PresentationBuilder};
use vouch_crypto::Disclosure;
use vouch_integration_tests::World;

const ALL_CLAIMS: [&str; 3] = ["address", "dateOfBirth", "name"];

fn subsets() -> Vec<Vec<&'static str>> {
    (0..1u8 << ALL_CLAIMS.len())
        .map(|mask| {
            ALL_CLAIMS
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, name)| *name)
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn test_decode_yields_exactly_selected_claims() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());

    for subset in subsets() {
        let bundle = sd_jwt::encode(&vc, &subset, &world.issuer.signer()).unwrap();
        let decoded = sd_jwt::decode(&bundle.present(&subset)).unwrap();

        let claims = &decoded.credential_subject.claims;
        let names: Vec<&str> = claims.keys().map(String::as_str).collect();
        assert_eq!(names, subset);
        assert_eq!(decoded.credential_subject.id, world.holder);
        for name in &subset {
            assert_eq!(decoded.credential_subject.claim(name), vc.credential_subject.claim(name));
        }
    }
}

#[tokio::test]
async fn test_sd_presentation_verifies_for_every_subset() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    let bundle = sd_jwt::encode(&vc, &ALL_CLAIMS, &world.issuer.signer()).unwrap();

    for subset in subsets() {
        let result = world.pipeline.verify_sd(&bundle.present(&subset)).await;
        assert_eq!(result.format, Format::SdJwt);
        assert!(result.is_valid, "subset {:?}: {:?}", subset, result.errors);
    }
}

#[tokio::test]
async fn test_disclosable_set_narrower_than_schema_verifies() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    let bundle = sd_jwt::encode(&vc, &["name"], &world.issuer.signer()).unwrap();

    let result = world.pipeline.verify_sd(&bundle.present(&["name"])).await;
    assert!(result.checks.schema_valid, "{:?}", result.errors);
    assert!(result.is_valid, "{:?}", result.errors);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_unknown_claim_silently_omitted() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    let bundle = sd_jwt::encode(&vc, &["name"], &world.issuer.signer()).unwrap();

    let presented = bundle.present(&["name", "dateOfBirth", "nationality"]);
    let decoded = sd_jwt::decode(&presented).unwrap();
    assert_eq!(decoded.credential_subject.claims.len(), 1);
    assert!(decoded.credential_subject.claim("dateOfBirth").is_none());
}

#[tokio::test]
async fn test_forged_disclosure_is_token_mismatch() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    let bundle = sd_jwt::encode(&vc, &ALL_CLAIMS, &world.issuer.signer()).unwrap();

    let forged = Disclosure::new("dateOfBirth", serde_json::json!("2010-01-01")).unwrap();
    let presented = format!("{}{}~", bundle.present(&["name"]), forged.encoded());
    assert!(matches!(sd_jwt::decode(&presented), Err(CredentialError::TokenMismatch(_))));

    let result = world.pipeline.verify_sd(&presented).await;
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 5);
}

#[tokio::test]
async fn test_envelope_from_other_key_fails_proof() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    let impostor = vouch_crypto::KeyPair::generate();
    let signer = vouch_identity::Signer::new(world.issuer.did(), &impostor);
    let bundle = sd_jwt::encode(&vc, &ALL_CLAIMS, &signer).unwrap();

    let result = world.pipeline.verify_sd(&bundle.present(&["name"])).await;
    assert!(!result.checks.proof_valid);
    assert!(result.checks.issuer_valid);
}

#[tokio::test]
async fn test_sentinel_credential_gives_sentinel_envelope() {
    let world = World::new();
    let vc = world.issue(ErrorInjection {
        invalid_signature: true,
        ..Default::default()
    });
    let bundle = sd_jwt::encode(&vc, &ALL_CLAIMS, &world.issuer.signer()).unwrap();

    let result = world.pipeline.verify_sd(&bundle.present(&ALL_CLAIMS)).await;
    assert!(!result.checks.proof_valid);
    assert!(result.checks.schema_valid && result.checks.issuer_valid);
}

#[tokio::test]
async fn test_full_vp_keeps_subject_byte_identical() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    let builder = PresentationBuilder::new(&world.holder, &world.holder_kp).unwrap();
    let vp = builder.wrap(&vc, &ALL_CLAIMS).unwrap();

    let embedded = &vp.verifiable_credential[0];
    assert_eq!(
        serde_json::to_vec(&embedded.credential_subject).unwrap(),
        serde_json::to_vec(&vc.credential_subject).unwrap()
    );
    assert!(!embedded.selectively_disclosed);

    let result = world.pipeline.verify_json(&serde_json::to_value(&vp).unwrap()).await;
    assert_eq!(result.format, Format::Vp);
    assert!(result.is_valid, "{:?}", result.errors);
}

#[tokio::test]
async fn test_partial_vp_is_disclosed_by_design() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    let builder = PresentationBuilder::new(&world.holder, &world.holder_kp).unwrap();
    let vp = builder.wrap(&vc, &["name"]).unwrap();

    let embedded = &vp.verifiable_credential[0];
    assert!(embedded.selectively_disclosed);
    assert_eq!(embedded.credential_subject.claims.len(), 1);
    assert_eq!(embedded.credential_subject.id, vc.credential_subject.id);
    assert_eq!(embedded.credential_subject.subject_type, vc.credential_subject.subject_type);

    let result = world.pipeline.verify_presentation(&vp).await;
    assert!(!result.checks.proof_valid);
    assert!(result.checks.schema_valid && result.checks.issuer_valid);
    assert!(result.checks.not_expired && result.checks.not_revoked);
    assert!(result.errors.iter().any(|e| e.contains("selectively disclosed by design")));
    assert!(!result.errors.iter().any(|e| e.contains("presentation signature")));
}

#[tokio::test]
async fn test_vp_with_revoked_credential() {
    let world = World::new();
    let good = world.issue(ErrorInjection::default());
    let revoked = world.issue(ErrorInjection {
        revoked: true,
        ..Default::default()
    });
    let builder = PresentationBuilder::new(&world.holder, &world.holder_kp).unwrap();
    let vp = builder.wrap_all(vec![good, revoked]).unwrap();

    let result = world.pipeline.verify_presentation(&vp).await;
    assert!(!result.checks.not_revoked);
    assert!(result.checks.proof_valid, "{:?}", result.errors);
    assert_eq!(
        result.errors,
        vec!["verifiableCredential[1]: credential has been revoked".to_string()]
    );
}

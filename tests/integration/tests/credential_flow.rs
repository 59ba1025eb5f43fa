//! Integration test: issuance, revocation and verification across crates.

use vouch_core::StatusState;
use vouch_credentials::{CredentialStore, ErrorInjection, Format, InMemoryCredentialStore};
use vouch_crypto::b64url_decode;
use vouch_integration_tests::World;

#[tokio::test]
async fn test_issued_credentials_verify() {
    let world = World::new();
    for _ in 0..3 {
        let vc = world.issue(ErrorInjection::default());
        let result = world.pipeline.verify(&vc).await;
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert_eq!(result.format, Format::Vc);
    }
}

#[tokio::test]
async fn test_credential_survives_json_transport() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    let text = serde_json::to_string_pretty(&vc).unwrap();

    let result = world.pipeline.verify_str(&text).await;
    assert!(result.is_valid, "{:?}", result.errors);
}

#[tokio::test]
async fn test_tampering_any_claim_breaks_proof() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());

    for claim in ["name", "dateOfBirth", "address"] {
        let mut json = serde_json::to_value(&vc).unwrap();
        json["credentialSubject"][claim] = serde_json::json!("forged");
        let result = world.pipeline.verify_json(&json).await;
        assert!(!result.checks.proof_valid, "tampering {} went unnoticed", claim);
        assert!(result.checks.schema_valid && result.checks.issuer_valid);
    }
}

#[tokio::test]
async fn test_expiry_injection_isolated() {
    let world = World::new();
    let vc = world.issue(ErrorInjection {
        expired: true,
        ..Default::default()
    });

    let result = world.pipeline.verify(&vc).await;
    assert!(!result.is_valid);
    assert!(!result.checks.not_expired);
    assert!(result.checks.schema_valid);
    assert!(result.checks.not_revoked);
    assert!(result.checks.proof_valid);
    assert!(result.checks.issuer_valid);
}

#[tokio::test]
async fn test_revocation_scenario() {
    let world = World::new();
    let vc = world.issue(ErrorInjection::default());
    assert!(world.pipeline.verify(&vc).await.is_valid);

    world.issuer.revoke(&vc.id).unwrap();
    let once = world.registry.is_revoked(&vc.id);
    world.issuer.revoke(&vc.id).unwrap();
    assert_eq!(world.registry.is_revoked(&vc.id), once);
    assert_eq!(world.registry.state(&vc.id), StatusState::Revoked);

    let result = world.pipeline.verify(&vc).await;
    assert!(!result.is_valid);
    assert!(!result.checks.not_revoked);
    assert_eq!(result.errors.iter().filter(|e| e.contains("revoked")).count(), 1);
}

#[tokio::test]
async fn test_status_indices_monotonic() {
    let world = World::new();
    let indices: Vec<u64> = (0..5)
        .map(|_| {
            world
                .issue(ErrorInjection::default())
                .credential_status
                .and_then(|s| s.index())
                .unwrap()
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_status_list_reflects_revocation() {
    let world = World::new();
    let _first = world.issue(ErrorInjection::default());
    let second = world.issue(ErrorInjection {
        revoked: true,
        ..Default::default()
    });

    let list = world.registry.status_list();
    let bits = b64url_decode(&list.credential_subject.encoded_list).unwrap();
    assert_eq!(bits, vec![0b0100_0000]);
    assert_eq!(second.credential_status.unwrap().status_list_credential, list.id);
}

#[tokio::test]
async fn test_injections_compose() {
    let world = World::new();
    let vc = world.issue(ErrorInjection {
        expired: true,
        revoked: true,
        invalid_signature: true,
        ..Default::default()
    });

    let result = world.pipeline.verify(&vc).await;
    assert!(!result.checks.not_expired);
    assert!(!result.checks.not_revoked);
    assert!(!result.checks.proof_valid);
    assert!(result.checks.schema_valid);
    assert!(result.checks.issuer_valid);
    assert!(result.errors.len() >= 3);
}

#[tokio::test]
async fn test_invalid_issuer_injection() {
    let world = World::new();
    let vc = world.issue(ErrorInjection {
        invalid_issuer: true,
        ..Default::default()
    });

    let result = world.pipeline.verify(&vc).await;
    assert!(!result.checks.issuer_valid);
    assert!(result.checks.proof_valid);
    assert!(result.errors.iter().any(|e| e.contains("malformed identifier")));
}

#[tokio::test]
async fn test_store_then_verify() {
    let world = World::new();
    let store = InMemoryCredentialStore::new();
    let vc = world.issue(ErrorInjection::default());
    store.save(vc.clone()).await.unwrap();

    let held = store.list_by_subject(&world.holder).await.unwrap();
    assert_eq!(held.len(), 1);
    assert!(world.pipeline.verify(&held[0]).await.is_valid);

    store.delete(&vc.id).await.unwrap();
    assert!(store.list().await.unwrap().is_empty());
}

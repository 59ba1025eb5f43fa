//! Integration test: authorization handshake followed by issuance.

use vouch_credentials::{
    AuthorizationProtocol, AuthorizationRequest, AuthorizationResponse, AuthorizationState,
    CredentialError, IssueOptions,
};
use vouch_integration_tests::{personal_claims, World};

fn protocol(world: &World) -> AuthorizationProtocol {
    AuthorizationProtocol::from_config(&world.config, world.engine.clone())
}

fn respond(
    world: &World,
    request: &AuthorizationRequest,
    holder: &str,
) -> Result<AuthorizationResponse, CredentialError> {
    AuthorizationProtocol::generate_response(request, holder, true, &world.holder_kp)
}

#[tokio::test]
async fn test_handshake_then_issue() {
    let world = World::new();
    let protocol = protocol(&world);

    let types = world.config.credentials.default_types.clone();
    let request = protocol.generate_request(types, "account opening");
    assert_eq!(request.issuer.id, world.issuer.did());
    assert_eq!(
        request.callback_url.as_deref(),
        Some(world.config.authorization.callback_url.as_str())
    );

    // Request travels to the wallet as JSON.
    let wire = serde_json::to_string(&request).unwrap();
    let received = serde_json::from_str(&wire).unwrap();
    let response = respond(&world, &received, &world.holder).unwrap();

    let outcome = protocol.verify_response(&request, &response).await.unwrap();
    assert!(outcome.valid, "{:?}", outcome.detail);
    assert_eq!(AuthorizationState::of(Some(&response)), AuthorizationState::Accepted);

    let vc = world
        .issuer
        .issue(&response.holder, personal_claims(), &IssueOptions::default())
        .unwrap();
    assert!(world.pipeline.verify(&vc).await.is_valid);
}

#[tokio::test]
async fn test_malformed_holder_never_signs() {
    let world = World::new();
    let request = protocol(&world).generate_request(vec![], "account opening");

    let result = respond(&world, &request, "not-a-did");
    assert!(matches!(result, Err(CredentialError::MalformedIdentifier(_))));
}

#[tokio::test]
async fn test_domain_swap_is_replay() {
    let world = World::new();
    let protocol = protocol(&world);
    let request = protocol.generate_request(vec![], "account opening");
    let response = respond(&world, &request, &world.holder).unwrap();

    let mut elsewhere = request.clone();
    elsewhere.domain = "attacker.example.com".into();
    assert!(matches!(
        protocol.verify_response(&elsewhere, &response).await,
        Err(CredentialError::ReplayMismatch(_))
    ));
}

#[tokio::test]
async fn test_response_claiming_other_holder() {
    let world = World::new();
    let protocol = protocol(&world);
    let request = protocol.generate_request(vec![], "account opening");
    let mut response = respond(&world, &request, &world.holder).unwrap();
    response.holder = "did:vouch:key:someoneElse".into();

    let outcome = protocol.verify_response(&request, &response).await.unwrap();
    assert!(!outcome.valid);
    assert!(outcome.detail.iter().any(|d| d.contains("does not belong to holder")));
}

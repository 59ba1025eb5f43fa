//! Fixtures shared by the cross-crate scenario tests.

use std::sync::Arc;

use vouch_core::{ClaimMap, EngineConfig};
use vouch_credentials::{
    CredentialIssuer, ErrorInjection, IssueOptions, RevocationRegistry, SchemaRegistry,
    VerificationPipeline,
};
use vouch_crypto::KeyPair;
use vouch_identity::{
    key_did, CompositeDidResolver, Credential, DidManager, KeyDidResolver, LocalDidResolver,
    ProofEngine,
};

/// An issuer registered under the configured `did:web` DID, a holder with a
/// self-certifying key DID, and a verifier sharing the issuer's registry.
pub struct World {
    pub config: EngineConfig,
    pub dids: Arc<DidManager>,
    pub registry: Arc<RevocationRegistry>,
    pub issuer: CredentialIssuer,
    pub engine: ProofEngine,
    pub pipeline: VerificationPipeline,
    pub holder_kp: KeyPair,
    pub holder: String,
}

impl World {
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let issuer_kp = KeyPair::from_seed(&[42u8; 32]);

        let dids = Arc::new(DidManager::new());
        dids.register(&config.issuer.did, &issuer_kp)
            .expect("issuer DID registers");
        let resolver = CompositeDidResolver::new()
            .with(LocalDidResolver::new(dids.clone()))
            .with(KeyDidResolver);
        let engine = ProofEngine::new(Arc::new(resolver))
            .with_timeout(config.verification.resolution_timeout());

        let list_url = config.credentials.status_list_base.clone();
        let registry = Arc::new(RevocationRegistry::new(list_url));
        let schemas = Arc::new(SchemaRegistry::new());
        let issuer =
            CredentialIssuer::from_config(&config, issuer_kp, registry.clone(), schemas.clone())
                .expect("issuer builds from default config");

        let holder_kp = KeyPair::generate();
        let holder = key_did(&holder_kp.public_key());

        Self {
            pipeline: VerificationPipeline::new(engine.clone(), registry.clone(), schemas),
            config,
            dids,
            registry,
            issuer,
            engine,
            holder_kp,
            holder,
        }
    }

    pub fn issue(&self, inject: ErrorInjection) -> Credential {
        self.issuer
            .issue(&self.holder, personal_claims(), &IssueOptions { inject, ..Default::default() })
            .expect("issuance succeeds")
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

pub fn personal_claims() -> ClaimMap {
    let mut claims = ClaimMap::new();
    claims.insert("name".into(), "Hanako Yamada".into());
    claims.insert("dateOfBirth".into(), "1988-04-12".into());
    claims.insert("address".into(), "2-3-1 Marunouchi, Chiyoda-ku, Tokyo".into());
    claims
}

//! `vouch present` — Wrap a credential in a holder-signed presentation.

use clap::Args;
use std::path::PathBuf;
use vouch_core::EngineConfig;
use vouch_credentials::PresentationBuilder;
use vouch_crypto::KeyPair;
use vouch_identity::key_did;

use crate::state::{emit, names, Engine};

#[derive(Args, Debug)]
pub struct PresentArgs {
    /// Credential id in the store, or path to a credential JSON file.
    #[arg(short, long)]
    pub credential: String,

    /// Holder key seed (hex), as printed by `vouch keygen`.
    #[arg(long)]
    pub holder_seed: String,

    /// Claims to disclose, comma-separated. All claims when omitted.
    #[arg(short, long, value_delimiter = ',')]
    pub disclose: Option<Vec<String>>,

    /// Verifier challenge and domain to bind the proof to.
    #[arg(long, requires = "domain")]
    pub challenge: Option<String>,

    #[arg(long)]
    pub domain: Option<String>,

    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub async fn run(args: &PresentArgs, config: EngineConfig) -> anyhow::Result<()> {
    let engine = Engine::open(config)?;
    let credential = engine.load_credential(&args.credential).await?;

    let holder_kp = KeyPair::from_seed_hex(&args.holder_seed)?;
    let holder = key_did(&holder_kp.public_key());
    let mut builder = PresentationBuilder::new(&holder, &holder_kp)?;
    if let (Some(challenge), Some(domain)) = (&args.challenge, &args.domain) {
        builder = builder.with_challenge(challenge, domain);
    }

    let disclosed = match &args.disclose {
        Some(list) => names(list),
        None => credential.credential_subject.disclosable_claims(),
    };
    let presentation = builder.wrap(&credential, &disclosed)?;

    emit(&serde_json::to_string_pretty(&presentation)?, args.out.as_deref())
}

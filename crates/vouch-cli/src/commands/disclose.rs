//! `vouch disclose` — Produce an SD-JWT presentation.

use clap::Args;
use std::path::PathBuf;
use vouch_core::EngineConfig;
use vouch_credentials::sd_jwt;

use crate::state::{emit, names, Engine};

#[derive(Args, Debug)]
pub struct DiscloseArgs {
    /// Credential id in the store, or path to a credential JSON file.
    #[arg(short, long)]
    pub credential: String,

    /// Claims to reveal, comma-separated.
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Claims made selectively disclosable, comma-separated. All claims when omitted.
    #[arg(long, value_delimiter = ',')]
    pub disclosable: Option<Vec<String>>,

    /// Also write the full disclosure bundle (JSON) here.
    #[arg(long)]
    pub bundle_out: Option<PathBuf>,

    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub async fn run(args: &DiscloseArgs, config: EngineConfig) -> anyhow::Result<()> {
    let engine = Engine::open(config)?;
    let credential = engine.load_credential(&args.credential).await?;

    let mut disclosable = match &args.disclosable {
        Some(list) => names(list),
        None => credential.credential_subject.disclosable_claims(),
    };
    disclosable.push(sd_jwt::SUBJECT_ID_CLAIM);

    let bundle = sd_jwt::encode(&credential, &disclosable, &engine.issuer.signer())?;
    if let Some(path) = &args.bundle_out {
        std::fs::write(path, serde_json::to_vec_pretty(&bundle)?)?;
    }

    emit(&bundle.present(&names(&args.select)), args.out.as_deref())
}

//! `vouch init` — Write a default config with a fresh issuer key.

use clap::Args;
use std::path::Path;
use vouch_core::EngineConfig;
use vouch_crypto::KeyPair;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,

    /// Issuer DID to configure.
    #[arg(long)]
    pub issuer_did: Option<String>,
}

pub fn run(args: &InitArgs, config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            config_path.display()
        );
    }

    let mut config = EngineConfig::default();
    if let Some(did) = &args.issuer_did {
        vouch_core::validate_did(did)?;
        config.issuer.did = did.clone();
    }
    let keypair = KeyPair::generate();
    config.issuer.key_seed_hex = Some(keypair.seed_hex());
    config.save(config_path)?;
    std::fs::create_dir_all(&config.storage.data_dir)?;

    tracing::info!(
        path = %config_path.display(),
        issuer = %config.issuer.did,
        "wrote default config"
    );
    println!("Initialized Vouch issuer");
    println!("  Config:     {}", config_path.display());
    println!("  Issuer DID: {}", config.issuer.did);
    println!("  Public key: {}", keypair.public_key().to_multibase());
    println!("  Data dir:   {}", config.storage.data_dir.display());
    Ok(())
}

//! `vouch revoke` — Revoke an issued credential.

use clap::Args;
use vouch_core::EngineConfig;

use crate::state::Engine;

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Credential id (urn:uuid:...).
    pub id: String,
}

pub fn run(args: &RevokeArgs, config: EngineConfig) -> anyhow::Result<()> {
    let engine = Engine::open(config)?;
    engine.issuer.revoke(&args.id)?;
    engine.persist_registry()?;

    println!("Revoked {}", args.id);
    println!("  Revoked in list: {} of {}", engine.registry.revoked_count(), engine.registry.len());
    Ok(())
}

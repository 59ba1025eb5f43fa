//! `vouch list` — List stored credentials.

use clap::Args;
use vouch_core::EngineConfig;
use vouch_credentials::CredentialStore;

use crate::state::Engine;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only credentials of this type.
    #[arg(short = 't', long = "type")]
    pub credential_type: Option<String>,

    /// Print the published status list instead.
    #[arg(long)]
    pub status_list: bool,
}

pub async fn run(args: &ListArgs, config: EngineConfig) -> anyhow::Result<()> {
    let engine = Engine::open(config)?;

    if args.status_list {
        println!("{}", serde_json::to_string_pretty(&engine.registry.status_list())?);
        return Ok(());
    }

    let credentials = match &args.credential_type {
        Some(t) => engine.store.list_by_type(t).await?,
        None => engine.store.list().await?,
    };
    if credentials.is_empty() {
        println!("No credentials stored.");
        return Ok(());
    }

    println!("{:<46} {:<26} {:<8} SUBJECT", "ID", "TYPE", "STATUS");
    for vc in &credentials {
        let status = if engine.registry.is_revoked(&vc.id) { "revoked" } else { "active" };
        println!(
            "{:<46} {:<26} {:<8} {}",
            vc.id,
            vc.display_type(),
            status,
            vc.credential_subject.id
        );
    }
    Ok(())
}

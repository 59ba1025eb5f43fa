//! Vouch CLI: local issuer, holder and verifier operations.
//!
//! Subcommands: init, keygen, issue, revoke, list, present, disclose, verify.

mod commands;
mod state;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vouch_core::EngineConfig;

/// Vouch: verifiable credential issuance and verification.
#[derive(Parser, Debug)]
#[command(name = "vouch", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "vouch.toml", global = true)]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration with a fresh issuer key.
    Init(commands::init::InitArgs),
    /// Generate a holder key and print its DID.
    Keygen(commands::keygen::KeygenArgs),
    /// Issue a signed credential.
    Issue(commands::issue::IssueArgs),
    /// Revoke an issued credential.
    Revoke(commands::revoke::RevokeArgs),
    /// List stored credentials with their revocation state.
    List(commands::list::ListArgs),
    /// Wrap a credential in a holder-signed presentation.
    Present(commands::present::PresentArgs),
    /// Produce an SD-JWT presentation disclosing selected claims.
    Disclose(commands::disclose::DiscloseArgs),
    /// Verify a credential, presentation or SD-JWT presentation.
    Verify(commands::verify::VerifyArgs),
}

fn init_tracing(config: &EngineConfig, override_level: Option<&str>) {
    let level = override_level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load(&cli.config)?;
    init_tracing(&config, cli.log_level.as_deref());

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Issue(args) => commands::issue::run(args, config).await,
        Commands::Revoke(args) => commands::revoke::run(args, config),
        Commands::List(args) => commands::list::run(args, config).await,
        Commands::Present(args) => commands::present::run(args, config).await,
        Commands::Disclose(args) => commands::disclose::run(args, config).await,
        Commands::Verify(args) => commands::verify::run(args, config).await,
    }
}

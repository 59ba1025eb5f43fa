//! `vouch verify` — Verify a credential, presentation or SD-JWT presentation.

use clap::Args;
use std::path::Path;
use vouch_core::EngineConfig;

use crate::state::Engine;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// File containing JSON or an SD-JWT presentation, or the value inline.
    pub input: String,

    /// Include resolved documents, validity window and proof internals.
    #[arg(long)]
    pub detailed: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: &VerifyArgs, config: EngineConfig) -> anyhow::Result<()> {
    let engine = Engine::open(config)?;
    let text = if Path::new(&args.input).exists() {
        std::fs::read_to_string(&args.input)?
    } else {
        args.input.clone()
    };

    let report = if args.detailed {
        let trimmed = text.trim();
        let value = if trimmed.starts_with('{') {
            serde_json::from_str(trimmed)?
        } else {
            serde_json::Value::String(trimmed.to_string())
        };
        let detailed = engine.pipeline.verify_detailed(&value).await;
        println!("{}", serde_json::to_string_pretty(&detailed)?);
        detailed.result
    } else {
        let result = engine.pipeline.verify_str(&text).await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            let mark = |ok: bool| if ok { "PASS" } else { "FAIL" };
            println!("Format: {:?}", result.format);
            println!("  schemaValid  {}", mark(result.checks.schema_valid));
            println!("  notExpired   {}", mark(result.checks.not_expired));
            println!("  notRevoked   {}", mark(result.checks.not_revoked));
            println!("  proofValid   {}", mark(result.checks.proof_valid));
            println!("  issuerValid  {}", mark(result.checks.issuer_valid));
            for error in &result.errors {
                println!("  - {}", error);
            }
        }
        result
    };

    if !report.is_valid {
        anyhow::bail!("verification failed with {} error(s)", report.errors.len());
    }
    println!("VALID");
    Ok(())
}

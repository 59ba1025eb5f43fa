//! `vouch issue` — Issue a signed credential.

use chrono::{Duration, Utc};
use clap::Args;
use std::path::PathBuf;
use vouch_core::{ClaimMap, ClaimValue, EngineConfig};
use vouch_credentials::{CredentialStore, ErrorInjection, IssueOptions};

use crate::state::{emit, Engine};

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Subject (holder) DID.
    #[arg(short, long)]
    pub subject: String,

    /// Claim as name=value; repeatable. Values that parse as JSON keep their type.
    #[arg(short = 'c', long = "claim", value_name = "NAME=VALUE")]
    pub claims: Vec<String>,

    /// Credential type(s), comma-separated. Defaults to the configured types.
    #[arg(short = 't', long = "type", value_delimiter = ',')]
    pub types: Vec<String>,

    /// Validity in days, overriding the configured default.
    #[arg(long)]
    pub valid_days: Option<i64>,

    /// Write the credential here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Inject a syntactically invalid issuer DID.
    #[arg(long)]
    pub invalid_issuer: bool,

    /// Back-date validUntil into the past.
    #[arg(long)]
    pub expired: bool,

    /// Omit all subject claims.
    #[arg(long)]
    pub missing_fields: bool,

    /// Emit the sentinel invalid signature.
    #[arg(long)]
    pub invalid_signature: bool,

    /// Revoke immediately after issuance.
    #[arg(long)]
    pub revoked: bool,
}

fn parse_claims(raw: &[String]) -> anyhow::Result<ClaimMap> {
    let mut claims = ClaimMap::new();
    for pair in raw {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("claim must be NAME=VALUE: {}", pair))?;
        let value = match serde_json::from_str::<serde_json::Value>(value) {
            Ok(json) if !json.is_string() => ClaimValue::try_from(json)?,
            _ => ClaimValue::from(value),
        };
        claims.insert(name.trim().to_string(), value);
    }
    Ok(claims)
}

pub async fn run(args: &IssueArgs, config: EngineConfig) -> anyhow::Result<()> {
    let engine = Engine::open(config)?;
    let options = IssueOptions {
        types: args.types.clone(),
        valid_until: args.valid_days.map(|d| Utc::now() + Duration::days(d)),
        inject: ErrorInjection {
            invalid_issuer: args.invalid_issuer,
            expired: args.expired,
            missing_fields: args.missing_fields,
            invalid_signature: args.invalid_signature,
            revoked: args.revoked,
        },
        ..Default::default()
    };

    let credential = engine.issuer.issue(&args.subject, parse_claims(&args.claims)?, &options)?;
    engine.store.save(credential.clone()).await?;
    engine.persist_registry()?;

    eprintln!("Issued {} to {}", credential.id, credential.credential_subject.id);
    emit(&serde_json::to_string_pretty(&credential)?, args.out.as_deref())
}

//! `vouch keygen` — Generate a holder key.

use clap::Args;
use vouch_crypto::KeyPair;
use vouch_identity::key_did;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    let keypair = KeyPair::generate();
    let did = key_did(&keypair.public_key());

    if args.json {
        let out = serde_json::json!({ "did": did, "seedHex": keypair.seed_hex() });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("DID:  {}", did);
        println!("Seed: {}", keypair.seed_hex());
        println!();
        println!("Keep the seed secret; pass it to `vouch present --holder-seed`.");
    }
    Ok(())
}

//! Engine state rebuilt from config and the data directory on each run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use vouch_core::EngineConfig;
use vouch_credentials::{
    CredentialIssuer, CredentialStore, FileCredentialStore, RevocationRegistry, SchemaRegistry,
    VerificationPipeline,
};
use vouch_crypto::KeyPair;
use vouch_identity::{
    CompositeDidResolver, Credential, DidManager, KeyDidResolver, LocalDidResolver, ProofEngine,
};

pub const REVOCATION_FILE: &str = "revocation.json";

pub struct Engine {
    pub config: EngineConfig,
    pub issuer: CredentialIssuer,
    pub registry: Arc<RevocationRegistry>,
    pub pipeline: VerificationPipeline,
    pub store: FileCredentialStore,
}

impl Engine {
    pub fn open(config: EngineConfig) -> anyhow::Result<Self> {
        let seed = config
            .issuer
            .key_seed_hex
            .as_deref()
            .context("no issuer key configured; run `vouch init` first")?;
        let issuer_kp = KeyPair::from_seed_hex(seed).context("invalid issuer key seed")?;

        let dids = Arc::new(DidManager::new());
        dids.register(&config.issuer.did, &issuer_kp)?;
        let resolver = CompositeDidResolver::new()
            .with(LocalDidResolver::new(dids))
            .with(KeyDidResolver);
        let engine = ProofEngine::new(Arc::new(resolver))
            .with_timeout(config.verification.resolution_timeout())
            .with_cryptosuites(config.verification.supported_cryptosuites.clone());

        let data_dir = config.storage.data_dir.clone();
        let registry = Arc::new(load_registry(&data_dir, &config.credentials.status_list_base)?);
        let schemas = Arc::new(SchemaRegistry::new());
        let issuer =
            CredentialIssuer::from_config(&config, issuer_kp, registry.clone(), schemas.clone())?;

        Ok(Self {
            pipeline: VerificationPipeline::new(engine, registry.clone(), schemas),
            store: FileCredentialStore::new(&data_dir),
            issuer,
            registry,
            config,
        })
    }

    fn registry_path(&self) -> PathBuf {
        self.config.storage.data_dir.join(REVOCATION_FILE)
    }

    pub fn persist_registry(&self) -> anyhow::Result<()> {
        let path = self.registry_path();
        write_atomic(&path, &serde_json::to_vec_pretty(&self.registry.snapshot())?)?;
        tracing::debug!(
            path = %path.display(),
            entries = self.registry.len(),
            "revocation registry saved"
        );
        Ok(())
    }

    /// A credential from a JSON file, or from the store by id.
    pub async fn load_credential(&self, reference: &str) -> anyhow::Result<Credential> {
        if Path::new(reference).exists() {
            let text = std::fs::read_to_string(reference)?;
            return serde_json::from_str(&text)
                .with_context(|| format!("{} is not a credential", reference));
        }
        self.store
            .get(reference)
            .await?
            .with_context(|| format!("no stored credential with id {}", reference))
    }
}

fn load_registry(data_dir: &Path, list_url: &str) -> anyhow::Result<RevocationRegistry> {
    let path = data_dir.join(REVOCATION_FILE);
    if !path.exists() {
        return Ok(RevocationRegistry::new(list_url));
    }
    let text = std::fs::read_to_string(&path)?;
    let snapshot =
        serde_json::from_str(&text).with_context(|| format!("corrupt {}", path.display()))?;
    Ok(RevocationRegistry::restore(snapshot))
}

/// Write through a sibling temp file and rename, so readers never see a
/// truncated file.
fn write_atomic(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Print to stdout, or write to `out` when given.
pub fn emit(text: &str, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Split comma-separated names, dropping blanks.
pub fn names(list: &[String]) -> Vec<&str> {
    list.iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

//! Engine configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreError;

/// Full configuration for the Vouch engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Issuer identity settings.
    #[serde(default)]
    pub issuer: IssuerConfig,

    /// Credential composition settings.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Verification pipeline settings.
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Authorization request settings.
    #[serde(default)]
    pub authorization: AuthorizationConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Issuer DID.
    #[serde(default = "default_issuer_did")]
    pub did: String,
    /// Display name shown to holders.
    #[serde(default = "default_issuer_name")]
    pub name: String,
    /// Optional logo reference.
    #[serde(default)]
    pub image: Option<String>,
    /// Hex-encoded 32-byte Ed25519 seed for the issuer key.
    #[serde(default)]
    pub key_seed_hex: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Default validity period in days.
    #[serde(default = "default_validity_days")]
    pub validity_days: i64,
    /// Type tags applied when the caller does not supply any.
    #[serde(default = "default_types")]
    pub default_types: Vec<String>,
    /// Schema referenced by issued credentials.
    #[serde(default = "default_schema_id")]
    pub schema_id: Option<String>,
    /// Base URL of the revocation status list.
    #[serde(default = "default_status_list_base")]
    pub status_list_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Upper bound for a single DID resolution, in milliseconds.
    #[serde(default = "default_resolution_timeout_ms")]
    pub resolution_timeout_ms: u64,
    /// Cryptosuites the proof engine accepts.
    #[serde(default = "default_cryptosuites")]
    pub supported_cryptosuites: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Domain embedded in authorization challenges.
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Callback URL advertised to wallets.
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_issuer_did() -> String {
    "did:web:demo-issuer.example.com".into()
}
fn default_issuer_name() -> String {
    "Demo Issuer Organization".into()
}
fn default_validity_days() -> i64 {
    365
}
fn default_types() -> Vec<String> {
    vec![
        "VerifiableCredential".into(),
        "PersonalInfoCredential".into(),
    ]
}
fn default_schema_id() -> Option<String> {
    Some("personal-info-v1".into())
}
fn default_status_list_base() -> String {
    "https://demo-issuer.example.com/status".into()
}
fn default_resolution_timeout_ms() -> u64 {
    5_000
}
fn default_cryptosuites() -> Vec<String> {
    vec!["eddsa-jcs-2022".into()]
}
fn default_domain() -> String {
    "demo-issuer.example.com".into()
}
fn default_callback_url() -> String {
    "https://demo-issuer.example.com/callback".into()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            did: default_issuer_did(),
            name: default_issuer_name(),
            image: None,
            key_seed_hex: None,
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            validity_days: default_validity_days(),
            default_types: default_types(),
            schema_id: default_schema_id(),
            status_list_base: default_status_list_base(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            resolution_timeout_ms: default_resolution_timeout_ms(),
            supported_cryptosuites: default_cryptosuites(),
        }
    }
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            callback_url: default_callback_url(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl VerificationConfig {
    /// Resolution timeout as a `Duration`.
    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.resolution_timeout_ms)
    }
}

impl EngineConfig {
    /// Load config from a TOML file, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: EngineConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}

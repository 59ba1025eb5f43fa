use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use vouch_identity::Credential;

use crate::error::CredentialError;

pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Keyed persistence for issued or held credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a credential. An id already present is rejected.
    async fn save(&self, credential: Credential) -> Result<(), CredentialError>;

    async fn get(&self, id: &str) -> Result<Option<Credential>, CredentialError>;

    async fn list(&self) -> Result<Vec<Credential>, CredentialError>;

    /// Remove a credential; unknown ids are `CredentialNotFound`.
    async fn delete(&self, id: &str) -> Result<Credential, CredentialError>;

    async fn list_by_type(
        &self,
        credential_type: &str,
    ) -> Result<Vec<Credential>, CredentialError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|vc| vc.types.iter().any(|t| t == credential_type))
            .collect())
    }

    async fn list_by_subject(&self, subject_did: &str) -> Result<Vec<Credential>, CredentialError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|vc| vc.credential_subject.id == subject_did)
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: DashMap<String, Credential>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn save(&self, credential: Credential) -> Result<(), CredentialError> {
        match self.credentials.entry(credential.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(CredentialError::DuplicateCredential(credential.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                tracing::debug!(credential_id = %credential.id, "credential stored");
                slot.insert(credential);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Credential>, CredentialError> {
        Ok(self.credentials.get(id).map(|e| e.value().clone()))
    }

    /// Oldest first.
    async fn list(&self) -> Result<Vec<Credential>, CredentialError> {
        let mut all: Vec<Credential> = self.credentials.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.valid_from.cmp(&b.valid_from).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn delete(&self, id: &str) -> Result<Credential, CredentialError> {
        self.credentials
            .remove(id)
            .map(|(_, vc)| vc)
            .ok_or_else(|| CredentialError::CredentialNotFound(id.to_string()))
    }
}

/// JSON array at `<data_dir>/credentials.json`, kept in insertion order.
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CREDENTIALS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Credential>, CredentialError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, credentials: &[Credential]) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(credentials)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(&self, credential: Credential) -> Result<(), CredentialError> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        if all.iter().any(|vc| vc.id == credential.id) {
            return Err(CredentialError::DuplicateCredential(credential.id));
        }
        tracing::debug!(
            credential_id = %credential.id,
            path = %self.path.display(),
            "credential stored"
        );
        all.push(credential);
        self.write_all(&all).await
    }

    async fn get(&self, id: &str) -> Result<Option<Credential>, CredentialError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.into_iter().find(|vc| vc.id == id))
    }

    async fn list(&self) -> Result<Vec<Credential>, CredentialError> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn delete(&self, id: &str) -> Result<Credential, CredentialError> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        let pos = all
            .iter()
            .position(|vc| vc.id == id)
            .ok_or_else(|| CredentialError::CredentialNotFound(id.to_string()))?;
        let removed = all.remove(pos);
        self.write_all(&all).await?;
        Ok(removed)
    }
}

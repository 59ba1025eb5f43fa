use std::collections::BTreeMap;
use std::sync::Mutex;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use vouch_core::{StatusEvent, StatusState, StatusStateMachine};
use vouch_crypto::b64url_encode;
use vouch_identity::credentials::{CredentialStatus, CREDENTIALS_CONTEXT_V2, VERIFIABLE_CREDENTIAL};

use crate::error::CredentialError;

pub const STATUS_LIST_CREDENTIAL: &str = "StatusList2021Credential";
pub const STATUS_LIST: &str = "StatusList2021";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    index: u64,
    state: StatusState,
}

/// Published view of the revocation bitstring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusListCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub credential_subject: StatusListSubject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusListSubject {
    pub id: String,
    #[serde(rename = "type")]
    pub subject_type: String,
    pub status_purpose: String,
    /// Base64url bitstring; bit `i` (MSB-first) set when index `i` is revoked.
    pub encoded_list: String,
}

/// Serializable registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    pub list_url: String,
    pub next_index: u64,
    pub entries: BTreeMap<String, SnapshotEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub index: u64,
    pub revoked: bool,
}

/// Assigns status-list indices and tracks revocation.
///
/// Writes (assignment, revocation) are serialized through the counter lock so
/// an index is never handed out twice. Reads go straight to the map.
pub struct RevocationRegistry {
    list_url: String,
    entries: DashMap<String, Entry>,
    next_index: Mutex<u64>,
}

impl RevocationRegistry {
    pub fn new(list_url: impl Into<String>) -> Self {
        Self {
            list_url: list_url.into(),
            entries: DashMap::new(),
            next_index: Mutex::new(0),
        }
    }

    pub fn list_url(&self) -> &str {
        &self.list_url
    }

    fn write_lock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.next_index.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Assign the next index to a credential id. Each id is assigned once.
    pub fn assign_index(&self, credential_id: &str) -> Result<u64, CredentialError> {
        let mut next = self.write_lock();
        if self.entries.contains_key(credential_id) {
            return Err(CredentialError::DuplicateCredential(credential_id.to_string()));
        }

        let state = StatusStateMachine::transition(StatusState::Unassigned, StatusEvent::Assign)?;
        let index = *next;
        *next += 1;
        self.entries.insert(credential_id.to_string(), Entry { index, state });

        tracing::debug!(credential_id, index, "status index assigned");
        Ok(index)
    }

    /// Assign an index and build the matching status entry.
    pub fn allocate(&self, credential_id: &str) -> Result<CredentialStatus, CredentialError> {
        let index = self.assign_index(credential_id)?;
        Ok(CredentialStatus::revocation(&self.list_url, index))
    }

    /// Revoke a credential. Revoking twice is not an error.
    pub fn revoke(&self, credential_id: &str) -> Result<(), CredentialError> {
        let _guard = self.write_lock();
        let mut entry = self
            .entries
            .get_mut(credential_id)
            .ok_or_else(|| CredentialError::CredentialNotFound(credential_id.to_string()))?;

        let was = entry.state;
        entry.state = StatusStateMachine::transition(was, StatusEvent::Revoke)?;
        if was != StatusState::Revoked {
            tracing::info!(credential_id, index = entry.index, "credential revoked");
        }
        Ok(())
    }

    pub fn is_revoked(&self, credential_id: &str) -> bool {
        self.state(credential_id) == StatusState::Revoked
    }

    pub fn state(&self, credential_id: &str) -> StatusState {
        self.entries
            .get(credential_id)
            .map(|e| e.state)
            .unwrap_or(StatusState::Unassigned)
    }

    pub fn index_of(&self, credential_id: &str) -> Option<u64> {
        self.entries.get(credential_id).map(|e| e.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn revoked_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == StatusState::Revoked)
            .count()
    }

    /// Revocation bitstring, base64url encoded.
    pub fn encoded_list(&self) -> String {
        // Held across the scan so no index past `next` appears mid-iteration.
        let next = self.write_lock();
        let mut bits = vec![0u8; ((*next as usize) + 7) / 8];
        for entry in self.entries.iter() {
            if entry.state == StatusState::Revoked {
                let i = entry.index as usize;
                bits[i / 8] |= 0x80 >> (i % 8);
            }
        }
        b64url_encode(bits)
    }

    pub fn status_list(&self) -> StatusListCredential {
        StatusListCredential {
            context: vec![CREDENTIALS_CONTEXT_V2.to_string()],
            id: self.list_url.clone(),
            types: vec![VERIFIABLE_CREDENTIAL.to_string(), STATUS_LIST_CREDENTIAL.to_string()],
            credential_subject: StatusListSubject {
                id: format!("{}#list", self.list_url),
                subject_type: STATUS_LIST.to_string(),
                status_purpose: "revocation".to_string(),
                encoded_list: self.encoded_list(),
            },
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let next = self.write_lock();
        let entries = self
            .entries
            .iter()
            .map(|e| {
                (
                    e.key().clone(),
                    SnapshotEntry {
                        index: e.index,
                        revoked: e.state == StatusState::Revoked,
                    },
                )
            })
            .collect();
        RegistrySnapshot {
            list_url: self.list_url.clone(),
            next_index: *next,
            entries,
        }
    }

    /// Rebuild a registry. The counter never falls behind an assigned index.
    pub fn restore(snapshot: RegistrySnapshot) -> Self {
        let highest = snapshot.entries.values().map(|e| e.index + 1).max().unwrap_or(0);
        let entries = snapshot
            .entries
            .into_iter()
            .map(|(id, e)| {
                let state = if e.revoked {
                    StatusState::Revoked
                } else {
                    StatusState::Active
                };
                (id, Entry { index: e.index, state })
            })
            .collect();
        Self {
            list_url: snapshot.list_url,
            entries,
            next_index: Mutex::new(snapshot.next_index.max(highest)),
        }
    }
}

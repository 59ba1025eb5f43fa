use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credentials::{Credential, CREDENTIALS_CONTEXT_V2};
use crate::proof::Proof;

pub const VERIFIABLE_PRESENTATION: &str = "VerifiablePresentation";

/// A holder-signed envelope around one or more credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub holder: String,
    pub verifiable_credential: Vec<Credential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl Presentation {
    /// Unsigned presentation with a fresh `urn:uuid` id.
    pub fn new(holder: impl Into<String>, credentials: Vec<Credential>) -> Self {
        Self {
            context: vec![CREDENTIALS_CONTEXT_V2.to_string()],
            id: format!("urn:uuid:{}", Uuid::new_v4()),
            types: vec![VERIFIABLE_PRESENTATION.to_string()],
            holder: holder.into(),
            verifiable_credential: credentials,
            proof: None,
        }
    }
}

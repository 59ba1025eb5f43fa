use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;

/// Validate DID syntax: `did:<method>:<method-specific-id>`.
///
/// The method is restricted to ASCII alphanumerics; the method-specific id to
/// ASCII alphanumerics, `.`, `-` and `:`. A fragment (`#key-1`) is not part of
/// a DID and is rejected here; use [`split_did_url`] first.
pub fn validate_did(did: &str) -> Result<(), CoreError> {
    let rest = did
        .strip_prefix("did:")
        .ok_or_else(|| CoreError::MalformedIdentifier(format!("missing 'did:' scheme: {}", did)))?;

    let (method, specific_id) = rest.split_once(':').ok_or_else(|| {
        CoreError::MalformedIdentifier(format!("missing method-specific id: {}", did))
    })?;

    if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::MalformedIdentifier(format!(
            "invalid DID method '{}' in {}",
            method, did
        )));
    }

    if specific_id.is_empty()
        || !specific_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'))
    {
        return Err(CoreError::MalformedIdentifier(format!(
            "invalid method-specific id in {}",
            did
        )));
    }

    Ok(())
}

/// Boolean form of [`validate_did`].
pub fn is_valid_did(did: &str) -> bool {
    validate_did(did).is_ok()
}

/// Split a DID URL (`did:web:example.com#key-1`) into the DID and its fragment.
pub fn split_did_url(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((did, fragment)) => (did, Some(fragment)),
        None => (url, None),
    }
}

/// A syntactically valid Decentralized Identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse and validate a DID string.
    pub fn parse(uri: impl Into<String>) -> Result<Self, CoreError> {
        let uri = uri.into();
        validate_did(&uri)?;
        Ok(Self(uri))
    }

    /// Build a DID from method and method-specific id components.
    pub fn from_parts(method: &str, identifier: &str) -> Result<Self, CoreError> {
        Self::parse(format!("did:{}:{}", method, identifier))
    }

    /// Get the full DID URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method (`web`, `vouch`, ...).
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        self.0.splitn(3, ':').nth(2).unwrap_or_default()
    }

    /// DID URL for a key fragment, e.g. `did:web:example.com#key-1`.
    pub fn key_id(&self, fragment: &str) -> String {
        format!("{}#{}", self.0, fragment)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value of a claim within a credential subject.
///
/// Serialized untagged, so a claim map reads as plain JSON. `null` is not a
/// claim value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<ClaimValue>),
    Map(BTreeMap<String, ClaimValue>),
}

/// Claim name → value, ordered by name.
pub type ClaimMap = BTreeMap<String, ClaimValue>;

impl ClaimValue {
    /// Borrow the string payload, if this is a string claim.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(ClaimValue::to_json).collect())
            }
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl TryFrom<serde_json::Value> for ClaimValue {
    type Error = CoreError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Err(CoreError::ValidationError(
                "null is not a valid claim value".into(),
            )),
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => Ok(Self::Number(n)),
            serde_json::Value::String(s) => Ok(Self::String(s)),
            serde_json::Value::Array(items) => Ok(Self::List(
                items
                    .into_iter()
                    .map(ClaimValue::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            serde_json::Value::Object(map) => Ok(Self::Map(
                map.into_iter()
                    .map(|(k, v)| ClaimValue::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            )),
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ClaimValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ClaimValue {
    fn from(i: i64) -> Self {
        Self::Number(i.into())
    }
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

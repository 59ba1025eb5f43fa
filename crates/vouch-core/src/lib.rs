//! Vouch Core — Fundamental types, errors, and configuration for the
//! Vouch credential engine.

pub mod config;
pub mod credential_state;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use credential_state::{StatusEvent, StatusState, StatusStateMachine};
pub use error::CoreError;
pub use types::{is_valid_did, split_did_url, validate_did, ClaimMap, ClaimValue, Did};

use crate::credential_state::StatusState;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidStateTransition { from: StatusState, to: StatusState },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),
}

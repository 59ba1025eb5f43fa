use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Revocation status of a credential id within a status list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusState {
    /// No status-list index has been assigned yet.
    Unassigned,
    /// Index assigned; the credential is not revoked.
    Active,
    /// Credential has been permanently revoked. Final state.
    Revoked,
}

impl StatusState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Revoked)
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => write!(f, "Unassigned"),
            Self::Active => write!(f, "Active"),
            Self::Revoked => write!(f, "Revoked"),
        }
    }
}

/// Events that drive status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// A status-list index is assigned at issuance.
    Assign,
    /// The issuer revokes the credential.
    Revoke,
}

/// Status transitions for the revocation registry.
///
/// Valid transitions:
/// - Unassigned → Active (Assign)
/// - Active → Revoked (Revoke)
/// - Revoked → Revoked (Revoke, idempotent)
pub struct StatusStateMachine;

impl StatusStateMachine {
    /// Attempt a state transition based on an event.
    pub fn transition(current: StatusState, event: StatusEvent) -> Result<StatusState, CoreError> {
        let new_state = match (current, event) {
            (StatusState::Unassigned, StatusEvent::Assign) => StatusState::Active,
            (StatusState::Active, StatusEvent::Revoke) => StatusState::Revoked,
            (StatusState::Revoked, StatusEvent::Revoke) => StatusState::Revoked,

            // Index reuse and revoking an unknown credential are both invalid
            (from, event) => {
                let to = match event {
                    StatusEvent::Assign => StatusState::Active,
                    StatusEvent::Revoke => StatusState::Revoked,
                };
                return Err(CoreError::InvalidStateTransition { from, to });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "status transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: StatusState, event: StatusEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}

//! Error types for the inbox services.

use frontdesk_database::StoreError;
use thiserror::Error;

/// Result type alias for inbox operations
pub type InboxResult<T> = Result<T, InboxError>;

/// Every failure an inbox operation can report. Any of them raised inside a
/// transaction aborts it.
#[derive(Debug, Error)]
pub enum InboxError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("user {user_id} is not a member of workspace {workspace_id}")]
    Unauthorized {
        user_id: String,
        workspace_id: String,
    },

    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("transaction aborted: {reason}")]
    TransactionAborted { reason: String },

    #[error("no eligible assignee in team {team}")]
    NoEligibleAssignee { team: String },
}

impl InboxError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn unauthorized(user_id: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self::Unauthorized {
            user_id: user_id.into(),
            workspace_id: workspace_id.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for InboxError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => InboxError::NotFound { entity, id },
            StoreError::Validation(reason) => InboxError::InvalidState { reason },
            StoreError::Conflict(reason) | StoreError::Backend(reason) => {
                InboxError::TransactionAborted { reason }
            }
        }
    }
}

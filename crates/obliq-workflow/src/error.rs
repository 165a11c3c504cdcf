//! Workflow error taxonomy

use crate::action::Action;
use obliq_store::StoreError;
use obliq_types::{ItemId, Role, WorkflowStatus};

/// Errors from [`crate::WorkflowMachine::apply_action`]
///
/// All variants except `Store` are reported to the caller with no mutation
/// applied. `InvalidTransition` is safe to retry after refetching the item.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Bad input (missing reason, malformed request)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Role not authorized for the action
    #[error("role {role} may not perform {action}")]
    Forbidden {
        /// The acting role
        role: Role,
        /// The requested action
        action: Action,
    },

    /// The item's current status does not admit the action, or the
    /// conditional write observed a concurrent transition
    #[error("cannot perform {action} from state {status}")]
    InvalidTransition {
        /// The requested action
        action: Action,
        /// The status the rejection was based on
        status: WorkflowStatus,
    },

    /// No such item
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Row store failed; the transition may or may not have been applied
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

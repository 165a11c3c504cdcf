//! Escalation error taxonomy
//!
//! `NoRecipient` is deliberately absent: resolving to nobody is a normal
//! chain outcome (the record expires), not an error.

use obliq_store::StoreError;
use obliq_types::EscalationId;

/// Errors from the escalation engine's entry points
#[derive(Debug, thiserror::Error)]
pub enum EscalationError {
    /// No such escalation record
    #[error("escalation record not found: {0}")]
    RecordNotFound(EscalationId),

    /// The caller is not the record's current recipient
    #[error("caller is not the current recipient of escalation {0}")]
    Forbidden(EscalationId),

    /// Acknowledge/resolve raced a sweep or another caller; the record is
    /// no longer pending
    #[error("escalation {0} is no longer pending")]
    NotPending(EscalationId),

    /// No rule row (tenant or default) exists for a level
    #[error("no escalation rule configured for level {0}")]
    MissingRule(u8),

    /// Row store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

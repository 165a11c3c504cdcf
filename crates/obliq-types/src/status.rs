//! Status enums for items, escalation records and notification log entries

use serde::{Deserialize, Serialize};

/// Item lifecycle status
///
/// Mutated only through validated transitions in `obliq-workflow`; the
/// variants are the complete, fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Freshly created, not yet seen by the assignee
    New,

    /// Assignee has acknowledged the obligation
    Acknowledged,

    /// Work underway
    InProgress,

    /// Assignee declared done, awaiting supervisor review
    DonePendingSupervisor,

    /// Supervisor sent it back for rework
    Returned,

    /// Pulled out of the normal flow and put in front of a manager
    EscalatedToManager,

    /// Terminal: reviewed and closed
    Finished,
}

impl WorkflowStatus {
    /// Whether this status admits no further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Acknowledged => "acknowledged",
            Self::InProgress => "in_progress",
            Self::DonePendingSupervisor => "done_pending_supervisor",
            Self::Returned => "returned",
            Self::EscalatedToManager => "escalated_to_manager",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Escalation record status
///
/// `Pending → {Acknowledged | Escalated | Resolved | Expired}`; the three
/// non-`Escalated` outcomes terminate the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    /// Waiting for the current recipient to act, deadline armed
    Pending,

    /// Current recipient acknowledged; chain closed
    Acknowledged,

    /// Deadline passed, hand-off to the next level recorded
    Escalated,

    /// Underlying obligation resolved out-of-band; chain closed
    Resolved,

    /// Chain exhausted (max level or no recipient); chain closed
    Expired,
}

impl EscalationStatus {
    /// Whether this status ends the chain (no successor records allowed)
    #[inline]
    #[must_use]
    pub fn is_chain_terminal(self) -> bool {
        matches!(self, Self::Acknowledged | Self::Resolved | Self::Expired)
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Acknowledged => "acknowledged",
            Self::Escalated => "escalated",
            Self::Resolved => "resolved",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Per-row status of a notification log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// Key reserved, send in flight
    Pending,

    /// At least one channel delivered
    Sent,

    /// Every attempted channel failed
    Failed,

    /// Deduplicated: the day-bucket key was already consumed
    Skipped,
}

/// Notification transport
///
/// The engine is transport-agnostic; these name the configured integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Chat platform bot message
    Chat,

    /// Messaging gateway (SMS)
    Sms,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chat => f.write_str("chat"),
            Self::Sms => f.write_str("sms"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_is_the_only_terminal_status() {
        assert!(WorkflowStatus::Finished.is_terminal());
        for s in [
            WorkflowStatus::New,
            WorkflowStatus::Acknowledged,
            WorkflowStatus::InProgress,
            WorkflowStatus::DonePendingSupervisor,
            WorkflowStatus::Returned,
            WorkflowStatus::EscalatedToManager,
        ] {
            assert!(!s.is_terminal());
        }
    }

    #[test]
    fn escalated_does_not_terminate_the_chain() {
        assert!(!EscalationStatus::Pending.is_chain_terminal());
        assert!(!EscalationStatus::Escalated.is_chain_terminal());
        assert!(EscalationStatus::Acknowledged.is_chain_terminal());
        assert!(EscalationStatus::Resolved.is_chain_terminal());
        assert!(EscalationStatus::Expired.is_chain_terminal());
    }

    #[test]
    fn status_serde_snake_case() {
        let json = serde_json::to_string(&WorkflowStatus::DonePendingSupervisor).unwrap();
        assert_eq!(json, "\"done_pending_supervisor\"");
    }
}
